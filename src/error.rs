use thiserror::Error;

/// 集計処理で発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// ISO-8601形式として解釈できないdurationを受け取った。
    #[error("malformed ISO-8601 duration {value:?}: {reason}")]
    MalformedDuration { value: String, reason: String },

    /// ISO-8601形式としては正しいが、秒に換算できないdurationを受け取った。
    #[error("unsupported ISO-8601 duration {value:?}: {reason}")]
    UnsupportedDuration { value: String, reason: String },

    /// durationの合計が`i64`の秒数に収まらない。
    #[error("total duration overflows at {value:?}")]
    DurationOverflow { value: String },
}

impl ReportError {
    pub(crate) fn malformed(value: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDuration {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(value: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedDuration {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(value: &str) -> Self {
        Self::DurationOverflow {
            value: value.to_string(),
        }
    }
}
