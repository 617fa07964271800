use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;

const DEFAULT_API_URL: &str = "http://localhost:4000/graphql";
const API_URL_ENV: &str = "CLOCKIFY_REPORT_API_URL";
const API_TOKEN_ENV: &str = "CLOCKIFY_REPORT_API_TOKEN";

/// GraphQL APIへの接続設定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
}

/// 設定ファイルの内容。省略された項目はデフォルト値か環境変数を使う。
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_url: Option<String>,
    api_token: Option<String>,
}

impl Config {
    /// 設定ファイルと環境変数から設定を読み込む。
    ///
    /// 環境変数`CLOCKIFY_REPORT_API_URL`と`CLOCKIFY_REPORT_API_TOKEN`は設定ファイルより優先する。
    pub fn load() -> Result<Self> {
        let file = match config_path() {
            Some(path) if path.exists() => {
                info!("Load config from {}", path.display());
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                parse_config_file(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            _ => {
                debug!("No config file found");
                ConfigFile::default()
            }
        };

        Ok(Self::resolve(file, |key| env::var(key).ok()))
    }

    /// 設定ファイルの値に環境変数の値を上書きする。
    fn resolve(file: ConfigFile, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup(API_URL_ENV)
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_token = lookup(API_TOKEN_ENV).or(file.api_token);

        Self { api_url, api_token }
    }
}

/// 設定ファイルのパス。`<config dir>/clockify-report/config.toml`
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clockify-report").join("config.toml"))
}

fn parse_config_file(content: &str) -> Result<ConfigFile> {
    toml::from_str(content).context("Invalid TOML")
}
