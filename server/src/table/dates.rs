//! Date handling: timezone offsets, local-day ranges and date-to-text formatting

use std::fmt::Debug;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;

use super::columns::{
    ColumnMetadata, DEFAULT_DATE_CULTURE, DEFAULT_DATE_FORMAT, DEFAULT_DATE_TIMEZONE,
};

/// Format, timezone and culture used to render dates as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatContext {
    pub format: String,
    pub timezone: String,
    pub culture: String,
}

impl Default for DateFormatContext {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
            timezone: DEFAULT_DATE_TIMEZONE.to_string(),
            culture: DEFAULT_DATE_CULTURE.to_string(),
        }
    }
}

impl DateFormatContext {
    pub fn new(
        format: impl Into<String>,
        timezone: impl Into<String>,
        culture: impl Into<String>,
    ) -> Self {
        Self {
            format: format.into(),
            timezone: timezone.into(),
            culture: culture.into(),
        }
    }

    /// Context for one column: column overrides first, then the request
    /// values, then the table defaults.
    pub fn resolve(column: &ColumnMetadata, request: &RequestDateContext<'_>) -> Self {
        fn pick(column: &Option<String>, request: Option<&str>, default: &str) -> String {
            let set = |s: &&str| !s.trim().is_empty();
            column
                .as_deref()
                .filter(set)
                .or(request.filter(set))
                .unwrap_or(default)
                .to_string()
        }

        Self {
            format: pick(&column.date_format, request.format, DEFAULT_DATE_FORMAT),
            timezone: pick(&column.date_timezone, request.timezone, DEFAULT_DATE_TIMEZONE),
            culture: pick(&column.date_culture, request.culture, DEFAULT_DATE_CULTURE),
        }
    }

    /// UTC offset of this context's timezone at the given instant
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        offset_at_instant(&self.timezone, instant)
    }
}

/// Date settings carried by a query request
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDateContext<'a> {
    pub format: Option<&'a str>,
    pub timezone: Option<&'a str>,
    pub culture: Option<&'a str>,
}

/// Parse "+HH:MM", "-HH:MM" or "HH:MM" into seconds east of UTC
fn parse_fixed_offset(value: &str) -> Option<i32> {
    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Offset for a timezone as of local midnight of `day`.
///
/// Accepts fixed offsets and IANA zone names. Anything else is treated as
/// UTC.
pub fn offset_for_local_day(timezone: &str, day: NaiveDate) -> FixedOffset {
    let timezone = timezone.trim();
    if let Some(secs) = parse_fixed_offset(timezone) {
        return FixedOffset::east_opt(secs).unwrap_or(Utc.fix());
    }
    if let Ok(tz) = timezone.parse::<Tz>() {
        let midnight = day.and_time(NaiveTime::MIN);
        return tz
            .offset_from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.offset_from_utc_datetime(&midnight))
            .fix();
    }
    Utc.fix()
}

/// Offset for a timezone at a UTC instant
pub fn offset_at_instant(timezone: &str, instant: DateTime<Utc>) -> FixedOffset {
    let timezone = timezone.trim();
    if let Some(secs) = parse_fixed_offset(timezone) {
        return FixedOffset::east_opt(secs).unwrap_or(Utc.fix());
    }
    if let Ok(tz) = timezone.parse::<Tz>() {
        return tz.offset_from_utc_datetime(&instant.naive_utc()).fix();
    }
    Utc.fix()
}

/// Calendar date of a filter value; the time of day is discarded.
///
/// The date is taken as written: an RFC 3339 value keeps its own local date.
pub fn parse_filter_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local().date());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    None
}

/// UTC bounds of the local day `[day, day + 1)` in the given timezone.
///
/// `None` when either bound falls outside the representable range.
pub fn local_day_utc_range(
    day: NaiveDate,
    timezone: &str,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let offset = offset_for_local_day(timezone, day);
    let start = day
        .and_time(NaiveTime::MIN)
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?
        .and_utc();
    let end = start.checked_add_signed(TimeDelta::days(1))?;
    Some((start, end))
}

/// Renders dates as text for text matching and display.
pub trait DateFormatter: Debug + Send + Sync {
    fn format(&self, value: DateTime<Utc>, context: &DateFormatContext) -> String;

    /// A strftime pattern producing the same text once the value has been
    /// shifted to the context's offset. SQL sources need it to match dates
    /// as text; formatters without one only work with in-memory sources.
    fn strftime_pattern(&self, _context: &DateFormatContext) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Year4,
    Year2,
    MonthName,
    MonthAbbr,
    Month2,
    Month,
    Day2,
    Day,
    WeekdayName,
    WeekdayAbbr,
    Hour24Pad,
    Hour24,
    Hour12Pad,
    Hour12,
    Minute,
    Second,
    Millis,
    AmPm,
    OffsetGmt,
    OffsetBasic,
    OffsetColon,
}

const PATTERN_LETTERS: &str = "yMdEHhmsSazZ";

/// Split a date pattern (`dd-MMM-yyyy HH:mm:ss zzzz` style) into tokens.
/// Text inside single quotes is literal; `''` is a single quote.
fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                literal.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                literal.push(chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if !PATTERN_LETTERS.contains(c) {
            literal.push(c);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i] == c {
            i += 1;
        }
        let run = i - start;
        let token = match (c, run) {
            ('y', 2) => Token::Year2,
            ('y', _) => Token::Year4,
            ('M', 1) => Token::Month,
            ('M', 2) => Token::Month2,
            ('M', 3) => Token::MonthAbbr,
            ('M', _) => Token::MonthName,
            ('d', 1) => Token::Day,
            ('d', _) => Token::Day2,
            ('E', 4) => Token::WeekdayName,
            ('E', _) => Token::WeekdayAbbr,
            ('H', 1) => Token::Hour24,
            ('H', _) => Token::Hour24Pad,
            ('h', 1) => Token::Hour12,
            ('h', _) => Token::Hour12Pad,
            ('m', _) => Token::Minute,
            ('s', _) => Token::Second,
            ('S', _) => Token::Millis,
            ('a', _) => Token::AmPm,
            ('z', _) => Token::OffsetGmt,
            ('Z', 5) => Token::OffsetColon,
            _ => Token::OffsetBasic,
        };
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}

fn gmt_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("GMT{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
}

/// Pattern for chrono's `format`
fn chrono_pattern(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Literal(text) => push_literal(&mut out, text),
            Token::Year4 => out.push_str("%Y"),
            Token::Year2 => out.push_str("%y"),
            Token::MonthName => out.push_str("%B"),
            Token::MonthAbbr => out.push_str("%b"),
            Token::Month2 => out.push_str("%m"),
            Token::Month => out.push_str("%-m"),
            Token::Day2 => out.push_str("%d"),
            Token::Day => out.push_str("%-d"),
            Token::WeekdayName => out.push_str("%A"),
            Token::WeekdayAbbr => out.push_str("%a"),
            Token::Hour24Pad => out.push_str("%H"),
            Token::Hour24 => out.push_str("%-H"),
            Token::Hour12Pad => out.push_str("%I"),
            Token::Hour12 => out.push_str("%-I"),
            Token::Minute => out.push_str("%M"),
            Token::Second => out.push_str("%S"),
            Token::Millis => out.push_str("%3f"),
            Token::AmPm => out.push_str("%p"),
            Token::OffsetGmt => out.push_str("GMT%:z"),
            Token::OffsetBasic => out.push_str("%z"),
            Token::OffsetColon => out.push_str("%:z"),
        }
    }
    out
}

/// Pattern for DuckDB's `strftime`, applied to a value already shifted by
/// `offset`. Offsets are rendered as literals.
fn duckdb_pattern(tokens: &[Token], offset: FixedOffset) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Literal(text) => push_literal(&mut out, text),
            Token::Millis => out.push_str("%g"),
            Token::OffsetGmt => push_literal(&mut out, &gmt_label(offset)),
            Token::OffsetBasic => push_literal(&mut out, &offset.to_string().replace(':', "")),
            Token::OffsetColon => push_literal(&mut out, &offset.to_string()),
            other => out.push_str(&chrono_pattern(std::slice::from_ref(other))),
        }
    }
    out
}

/// Date formatter backed by chrono.
///
/// Understands the common date pipe letters (`yyyy`, `MMM`, `dd`, `HH`,
/// `mm`, `ss`, `SSS`, `a`, `EEE`, `zzzz`, `ZZZZZ`). Names are rendered in
/// English whatever the culture.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDateFormatter;

impl DateFormatter for ChronoDateFormatter {
    fn format(&self, value: DateTime<Utc>, context: &DateFormatContext) -> String {
        let offset = context.offset_at(value);
        let pattern = chrono_pattern(&tokenize(&context.format));
        value.with_timezone(&offset).format(&pattern).to_string()
    }

    fn strftime_pattern(&self, context: &DateFormatContext) -> Option<String> {
        let offset = context.offset_at(Utc::now());
        Some(duckdb_pattern(&tokenize(&context.format), offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fixed_offsets() {
        assert_eq!(parse_fixed_offset("+02:00"), Some(7200));
        assert_eq!(parse_fixed_offset("02:00"), Some(7200));
        assert_eq!(parse_fixed_offset("-05:30"), Some(-19800));
        assert_eq!(parse_fixed_offset("bogus"), None);
        assert_eq!(parse_fixed_offset("+25:00"), None);
    }

    #[test]
    fn test_unparsable_timezone_is_utc() {
        let offset = offset_for_local_day("not a zone", date(2024, 6, 18));
        assert_eq!(offset.local_minus_utc(), 0);
    }

    #[test]
    fn test_iana_zone_offset_at_local_midnight() {
        let summer = offset_for_local_day("Europe/Madrid", date(2024, 6, 18));
        assert_eq!(summer.local_minus_utc(), 7200);
        let winter = offset_for_local_day("Europe/Madrid", date(2024, 1, 18));
        assert_eq!(winter.local_minus_utc(), 3600);
    }

    #[test]
    fn test_local_day_range_positive_offset() {
        let (start, end) = local_day_utc_range(date(2024, 6, 18), "+02:00").unwrap();
        assert_eq!(start.to_rfc3339(), "2024-06-17T22:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-06-18T22:00:00+00:00");
    }

    #[test]
    fn test_local_day_range_negative_offset() {
        let (start, _) = local_day_utc_range(date(2024, 6, 18), "-03:00").unwrap();
        assert_eq!(start.to_rfc3339(), "2024-06-18T03:00:00+00:00");
    }

    #[test]
    fn test_local_day_range_at_calendar_limits() {
        let last = parse_filter_date("+262142-12-31").unwrap();
        assert!(local_day_utc_range(last, "+00:00").is_none());
        assert!(local_day_utc_range(NaiveDate::MIN, "+05:00").is_none());
        assert!(local_day_utc_range(NaiveDate::MIN, "-05:00").is_some());
    }

    #[test]
    fn test_parse_filter_date_discards_time() {
        assert_eq!(parse_filter_date("2024-06-18"), Some(date(2024, 6, 18)));
        assert_eq!(
            parse_filter_date("2024-06-18T23:59:00"),
            Some(date(2024, 6, 18))
        );
        assert_eq!(
            parse_filter_date("2024-06-18T10:00:00+02:00"),
            Some(date(2024, 6, 18))
        );
        assert_eq!(parse_filter_date("yesterday"), None);
    }

    #[test]
    fn test_default_format() {
        let value = Utc.with_ymd_and_hms(2024, 6, 17, 22, 30, 5).unwrap();
        let ctx = DateFormatContext::new("dd-MMM-yyyy HH:mm:ss zzzz", "+02:00", "en-US");
        assert_eq!(
            ChronoDateFormatter.format(value, &ctx),
            "18-Jun-2024 00:30:05 GMT+02:00"
        );
    }

    #[test]
    fn test_quoted_literals_and_percent() {
        let value = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let ctx = DateFormatContext::new("d 'de' MMMM '100%'", "+00:00", "es-ES");
        assert_eq!(ChronoDateFormatter.format(value, &ctx), "5 de January 100%");
    }

    #[test]
    fn test_strftime_pattern_for_sql() {
        let ctx = DateFormatContext::new("dd-MMM-yyyy HH:mm:ss.SSS zzzz", "-03:00", "en-US");
        assert_eq!(
            ChronoDateFormatter.strftime_pattern(&ctx).unwrap(),
            "%d-%b-%Y %H:%M:%S.%g GMT-03:00"
        );
    }

    #[test]
    fn test_resolve_precedence() {
        let schema = crate::table::columns::TableSchema::from_parts(
            &["created", "updated"],
            vec![
                crate::table::columns::ColumnDef::new(
                    "created",
                    crate::table::columns::DataType::Date,
                )
                .date_context(None, Some("+05:00"), None),
                crate::table::columns::ColumnDef::new(
                    "updated",
                    crate::table::columns::DataType::Date,
                ),
            ],
        );
        let request = RequestDateContext {
            format: Some("yyyy"),
            timezone: Some("+01:00"),
            culture: None,
        };

        let created = DateFormatContext::resolve(schema.columns()[0].metadata(), &request);
        assert_eq!(created.timezone, "+05:00");
        assert_eq!(created.format, "yyyy");
        assert_eq!(created.culture, DEFAULT_DATE_CULTURE);

        let updated = DateFormatContext::resolve(schema.columns()[1].metadata(), &request);
        assert_eq!(updated.timezone, "+01:00");
    }
}
