use crate::error::ReportError;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// 日付部の指定子と秒換算値。年と月は基準日がないと秒に換算できないため`None`とする。
const DATE_DESIGNATORS: [(char, Option<i64>); 4] = [
    ('Y', None),
    ('M', None),
    ('W', Some(SECONDS_PER_WEEK)),
    ('D', Some(SECONDS_PER_DAY)),
];

const TIME_DESIGNATORS: [(char, Option<i64>); 3] = [
    ('H', Some(SECONDS_PER_HOUR)),
    ('M', Some(SECONDS_PER_MINUTE)),
    ('S', Some(1)),
];

/// 小数部として扱う最大桁数。
const MAX_FRACTION_DIGITS: usize = 9;

/// ISO-8601形式のdurationを秒に変換する。
///
/// `PT1H30M`のような時間部だけの表記に加えて、週(`W`)と日(`D`)も受け付ける。
/// 小数部は秒未満を切り捨てる。負のdurationは受け付けない。
///
/// # Arguments
///
/// * `value` - ISO-8601形式のduration
///
/// # Examples
///
/// ```
/// assert_eq!(parse_duration("PT1H30M").unwrap(), 5400);
/// ```
pub fn parse_duration(value: &str) -> Result<i64, ReportError> {
    if value.starts_with('-') {
        return Err(ReportError::malformed(value, "negative durations are not accepted"));
    }
    let body = value
        .strip_prefix('P')
        .ok_or_else(|| ReportError::malformed(value, "missing leading 'P'"))?;

    let (date_part, time_part) = match body.split_once('T') {
        Some((_, "")) => return Err(ReportError::malformed(value, "empty time part")),
        Some((date, time)) => (date, time),
        None => (body, ""),
    };

    let (date_seconds, date_count) = sum_components(value, date_part, &DATE_DESIGNATORS)?;
    let (time_seconds, time_count) = sum_components(value, time_part, &TIME_DESIGNATORS)?;
    if date_count + time_count == 0 {
        return Err(ReportError::malformed(value, "no duration components"));
    }

    date_seconds
        .checked_add(time_seconds)
        .ok_or_else(|| ReportError::overflow(value))
}

/// 指定子付きの数値を順に読み、秒の合計と読んだ要素数を返す。
fn sum_components(
    value: &str,
    part: &str,
    designators: &[(char, Option<i64>)],
) -> Result<(i64, usize), ReportError> {
    let mut total = 0i64;
    let mut count = 0;
    let mut next_designator = 0;
    let mut amount = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            amount.push(c);
            continue;
        }

        let position = designators[next_designator..]
            .iter()
            .position(|(designator, _)| *designator == c)
            .map(|offset| next_designator + offset)
            .ok_or_else(|| ReportError::malformed(value, format!("unexpected '{}'", c)))?;
        let unit = designators[position]
            .1
            .ok_or_else(|| ReportError::unsupported(value, "years and months have no fixed length"))?;

        let seconds = amount_to_seconds(value, &amount, unit)?;
        total = total
            .checked_add(seconds)
            .ok_or_else(|| ReportError::overflow(value))?;
        count += 1;
        next_designator = position + 1;
        amount.clear();
    }

    if !amount.is_empty() {
        return Err(ReportError::malformed(value, "number without designator"));
    }

    Ok((total, count))
}

/// `1.5`のような数値を単位秒で換算する。秒未満は切り捨てる。
fn amount_to_seconds(value: &str, amount: &str, unit: i64) -> Result<i64, ReportError> {
    let (whole, fraction) = match amount.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() {
        return Err(ReportError::malformed(value, "missing number"));
    }
    if fraction.contains(['.', ',']) {
        return Err(ReportError::malformed(value, "multiple decimal separators"));
    }

    let overflow = || ReportError::overflow(value);
    let whole: i64 = whole.parse().map_err(|_| overflow())?;
    let mut seconds = whole.checked_mul(unit).ok_or_else(overflow)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let numerator: i64 = fraction.parse().map_err(|_| overflow())?;
        let denominator = 10i64.pow(fraction.len() as u32);
        let partial = numerator.checked_mul(unit).ok_or_else(overflow)? / denominator;
        seconds = seconds.checked_add(partial).ok_or_else(overflow)?;
    }

    Ok(seconds)
}

/// 1時間未満の端数(分)を30分単位で切り上げる。
///
/// 秒の端数は切り捨ててから判定する。`0`はそのまま`0`を返す。
pub fn duration_round_up_by_half_hour(seconds: i64) -> i64 {
    if seconds == 0 {
        return 0;
    }

    let hours = seconds.div_euclid(SECONDS_PER_HOUR);
    let minutes = seconds.rem_euclid(SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let rounded_minutes = (minutes + 29) / 30 * 30;

    hours * SECONDS_PER_HOUR + rounded_minutes * SECONDS_PER_MINUTE
}
