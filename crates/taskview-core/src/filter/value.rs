//! Value coercion for filter clauses.
//!
//! Raw value text is typed in a fixed precedence order: booleans, integers,
//! decimals, `now` expressions, ISO dates, then plain strings. Anything that
//! does not match a typed form falls through to a string.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;

use super::ast::{FilterValue, Scalar};
use super::error::{FilterError, FilterResult};

/// A value as it appeared in the filter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawValue {
    /// Text that was enclosed in quotes, without the quotes.
    Quoted(String),
    /// Unquoted source text.
    Bare(String),
}

/// Evaluation context for value coercion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueContext {
    /// Reference instant for `now` expressions.
    pub now: DateTime<Utc>,
    /// Timezone for dates without an explicit offset.
    pub tz: Tz,
}

/// Parses an IANA timezone name. An empty name means UTC.
///
/// # Errors
///
/// Returns `FilterError::InvalidTimezone` for unknown names.
pub fn parse_timezone(name: &str) -> FilterResult<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Tz::UTC);
    }
    name.parse::<Tz>()
        .map_err(|_| FilterError::InvalidTimezone {
            name: name.to_string(),
        })
}

/// Coerces a single raw value.
pub(crate) fn coerce_scalar(raw: &RawValue, ctx: &ValueContext) -> FilterResult<Scalar> {
    match raw {
        RawValue::Bare(text) => {
            if let Some(b) = parse_bool(text) {
                return Ok(Scalar::Bool(b));
            }
            coerce_untyped(text, ctx, false)
        }
        RawValue::Quoted(text) => coerce_untyped(text, ctx, true),
    }
}

/// Coerces the value of an `in` / `not in` clause into a list.
///
/// Outer parentheses are stripped, the text is split on commas and each
/// element is coerced on its own. Booleans are not recognized in lists.
pub(crate) fn coerce_list(raw: &RawValue, ctx: &ValueContext) -> FilterResult<FilterValue> {
    let text = match raw {
        RawValue::Quoted(text) => text.as_str(),
        RawValue::Bare(text) => {
            let trimmed = text.trim();
            trimmed
                .strip_prefix('(')
                .and_then(|t| t.strip_suffix(')'))
                .unwrap_or(trimmed)
        }
    };

    let mut items = Vec::new();
    for element in text.split(',') {
        let element = element.trim();
        if element.is_empty() {
            continue;
        }
        let scalar = match unquote(element) {
            Some(inner) => coerce_untyped(inner, ctx, true)?,
            None => coerce_untyped(element, ctx, false)?,
        };
        items.push(scalar);
    }
    Ok(FilterValue::List(items))
}

/// Strips one matching pair of single or double quotes.
fn unquote(text: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

/// Applies the numeric, date and string rules.
///
/// Quoted text only takes part in the date rules; quoted digits stay text.
fn coerce_untyped(text: &str, ctx: &ValueContext, quoted: bool) -> FilterResult<Scalar> {
    if !quoted {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Scalar::Int(i));
        }
        if looks_decimal(text) {
            if let Ok(f) = text.parse::<f64>() {
                return Ok(Scalar::Float(f));
            }
        }
    }

    if let Some(time) = parse_relative(text.trim(), ctx) {
        return Ok(Scalar::Time(time));
    }

    if let Some(time) = parse_date(text.trim(), ctx)? {
        return Ok(Scalar::Time(time));
    }

    Ok(Scalar::Text(text.to_string()))
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Returns true for `[+-]digits.digits` shaped text.
fn looks_decimal(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut dots = 0;
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '.' => dots += 1,
            '0'..='9' => digits += 1,
            _ => return false,
        }
    }
    dots == 1 && digits > 0
}

// ==================== Relative dates ====================

/// A date math unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Unit::Second),
            'm' => Some(Unit::Minute),
            'h' | 'H' => Some(Unit::Hour),
            'd' => Some(Unit::Day),
            'w' => Some(Unit::Week),
            'M' => Some(Unit::Month),
            'y' => Some(Unit::Year),
            _ => None,
        }
    }
}

/// Parses `now`, `now+30d`, `now-1w+2h`, `now/d`.
///
/// Returns `None` if the text is not a `now` expression at all.
fn parse_relative(text: &str, ctx: &ValueContext) -> Option<DateTime<Utc>> {
    let rest = text.strip_prefix("now")?;
    let mut time = ctx.now.with_timezone(&ctx.tz);
    let mut chars = rest.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '+' | '-' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(*d);
                    chars.next();
                }
                let amount: i64 = if digits.is_empty() {
                    1
                } else {
                    digits.parse().ok()?
                };
                let unit = Unit::from_char(chars.next()?)?;
                let amount = if c == '-' { -amount } else { amount };
                time = shift(time, amount, unit)?;
            }
            '/' => {
                let unit = Unit::from_char(chars.next()?)?;
                if chars.next().is_some() {
                    return None;
                }
                time = round_down(time, unit)?;
            }
            _ => return None,
        }
    }

    Some(time.with_timezone(&Utc))
}

fn shift(time: DateTime<Tz>, amount: i64, unit: Unit) -> Option<DateTime<Tz>> {
    let fixed = match unit {
        Unit::Second => Duration::try_seconds(amount),
        Unit::Minute => Duration::try_minutes(amount),
        Unit::Hour => Duration::try_hours(amount),
        Unit::Day => Duration::try_days(amount),
        Unit::Week => Duration::try_weeks(amount),
        Unit::Month => return shift_months(time, amount),
        Unit::Year => return shift_months(time, amount.checked_mul(12)?),
    };
    time.checked_add_signed(fixed?)
}

fn shift_months(time: DateTime<Tz>, amount: i64) -> Option<DateTime<Tz>> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        time.checked_add_months(months)
    } else {
        time.checked_sub_months(months)
    }
}

fn round_down(time: DateTime<Tz>, unit: Unit) -> Option<DateTime<Tz>> {
    let local = time.naive_local();
    let date = local.date();
    let rounded = match unit {
        Unit::Second => date.and_hms_opt(local.hour(), local.minute(), local.second())?,
        Unit::Minute => date.and_hms_opt(local.hour(), local.minute(), 0)?,
        Unit::Hour => date.and_hms_opt(local.hour(), 0, 0)?,
        Unit::Day => date.and_time(NaiveTime::MIN),
        Unit::Week => {
            let offset = i64::from(date.weekday().num_days_from_monday());
            (date - Duration::days(offset)).and_time(NaiveTime::MIN)
        }
        Unit::Month => date.with_day(1)?.and_time(NaiveTime::MIN),
        Unit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_time(NaiveTime::MIN),
    };
    Some(localize(&time.timezone(), rounded).with_timezone(&time.timezone()))
}

// ==================== Absolute dates ====================

/// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and RFC 3339 timestamps.
///
/// Returns `Ok(None)` when the text does not have a date shape, and
/// `FilterError::InvalidDate` when it does but names no real date.
fn parse_date(text: &str, ctx: &ValueContext) -> FilterResult<Option<DateTime<Utc>>> {
    let Some(date) = parse_ymd_prefix(text) else {
        return Ok(None);
    };
    let date = date.ok_or_else(|| FilterError::invalid_date(text))?;
    let rest = &text[10..];

    if rest.is_empty() {
        return Ok(Some(localize(&ctx.tz, date.and_time(NaiveTime::MIN))));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    let time_text = rest
        .strip_prefix(' ')
        .or_else(|| rest.strip_prefix('T'))
        .ok_or_else(|| FilterError::invalid_date(text))?;

    let time = NaiveTime::parse_from_str(time_text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_text, "%H:%M"))
        .map_err(|_| FilterError::invalid_date(text))?;

    Ok(Some(localize(&ctx.tz, NaiveDateTime::new(date, time))))
}

/// Checks for a `dddd-dd-dd` prefix.
///
/// Returns `None` if the shape does not match, `Some(None)` if it matches but
/// is not a valid date. Year zero is accepted.
fn parse_ymd_prefix(text: &str) -> Option<Option<NaiveDate>> {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    let shape_ok = bytes[..10].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }

    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[5..7].parse().ok()?;
    let day: u32 = text[8..10].parse().ok()?;
    Some(NaiveDate::from_ymd_opt(year, month, day))
}

/// Interprets a local wall-clock time in `tz`.
///
/// Ambiguous times take the earlier instant; times inside a DST gap are read
/// as UTC wall-clock time.
fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(tz: Tz) -> ValueContext {
        ValueContext {
            now: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
            tz,
        }
    }

    fn bare(s: &str) -> RawValue {
        RawValue::Bare(s.to_string())
    }

    fn quoted(s: &str) -> RawValue {
        RawValue::Quoted(s.to_string())
    }

    #[test]
    fn test_coerce_bool() {
        let c = ctx(Tz::UTC);
        assert_eq!(coerce_scalar(&bare("true"), &c).unwrap(), Scalar::Bool(true));
        assert_eq!(coerce_scalar(&bare("FALSE"), &c).unwrap(), Scalar::Bool(false));
    }

    #[test]
    fn test_coerce_integers() {
        let c = ctx(Tz::UTC);
        assert_eq!(coerce_scalar(&bare("42"), &c).unwrap(), Scalar::Int(42));
        assert_eq!(coerce_scalar(&bare("-7"), &c).unwrap(), Scalar::Int(-7));
        assert_eq!(coerce_scalar(&bare("+3"), &c).unwrap(), Scalar::Int(3));
    }

    #[test]
    fn test_coerce_float() {
        let c = ctx(Tz::UTC);
        assert_eq!(coerce_scalar(&bare("0.5"), &c).unwrap(), Scalar::Float(0.5));
        assert_eq!(
            coerce_scalar(&bare("1e5"), &c).unwrap(),
            Scalar::Text("1e5".to_string())
        );
    }

    #[test]
    fn test_quoted_digits_stay_text() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_scalar(&quoted("42"), &c).unwrap(),
            Scalar::Text("42".to_string())
        );
    }

    #[test]
    fn test_relative_now() {
        let c = ctx(Tz::UTC);
        assert_eq!(coerce_scalar(&bare("now"), &c).unwrap(), Scalar::Time(c.now));
        assert_eq!(
            coerce_scalar(&bare("now+30d"), &c).unwrap(),
            Scalar::Time(c.now + Duration::days(30))
        );
        assert_eq!(
            coerce_scalar(&bare("now-1w+2h"), &c).unwrap(),
            Scalar::Time(c.now - Duration::weeks(1) + Duration::hours(2))
        );
    }

    #[test]
    fn test_relative_inside_quotes() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_scalar(&quoted("now+7d"), &c).unwrap(),
            Scalar::Time(c.now + Duration::days(7))
        );
    }

    #[test]
    fn test_relative_months() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_scalar(&bare("now+1M"), &c).unwrap(),
            Scalar::Time(Utc.with_ymd_and_hms(2024, 4, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            coerce_scalar(&bare("now-1y"), &c).unwrap(),
            Scalar::Time(Utc.with_ymd_and_hms(2023, 3, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_relative_rounding_uses_timezone() {
        let c = ctx(chrono_tz::Europe::Berlin);
        // 10:30 UTC is 11:30 in Berlin (CET); start of day is 23:00 UTC the day before.
        assert_eq!(
            coerce_scalar(&bare("now/d"), &c).unwrap(),
            Scalar::Time(Utc.with_ymd_and_hms(2024, 3, 14, 23, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_malformed_relative_falls_through_to_text() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_scalar(&bare("nowhere"), &c).unwrap(),
            Scalar::Text("nowhere".to_string())
        );
        assert_eq!(
            coerce_scalar(&bare("now+5x"), &c).unwrap(),
            Scalar::Text("now+5x".to_string())
        );
    }

    #[test]
    fn test_iso_date_midnight_in_timezone() {
        let c = ctx(chrono_tz::America::New_York);
        assert_eq!(
            coerce_scalar(&bare("2024-01-10"), &c).unwrap(),
            Scalar::Time(Utc.with_ymd_and_hms(2024, 1, 10, 5, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_zero_year_parses() {
        let c = ctx(Tz::UTC);
        let value = coerce_scalar(&bare("0000-01-01"), &c).unwrap();
        let Scalar::Time(t) = value else {
            panic!("expected a time, got {:?}", value);
        };
        assert_eq!(t.year(), 0);
    }

    #[test]
    fn test_invalid_calendar_date_is_error() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_scalar(&bare("2024-13-45"), &c).unwrap_err(),
            FilterError::invalid_date("2024-13-45")
        );
    }

    #[test]
    fn test_date_with_time_and_rfc3339() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_scalar(&quoted("2024-01-10 14:30"), &c).unwrap(),
            Scalar::Time(Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap())
        );
        assert_eq!(
            coerce_scalar(&bare("2024-01-10T14:30:00+02:00"), &c).unwrap(),
            Scalar::Time(Utc.with_ymd_and_hms(2024, 1, 10, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_list_of_ints() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_list(&bare("1, 2 ,3"), &c).unwrap(),
            FilterValue::List(vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)])
        );
    }

    #[test]
    fn test_list_from_quoted_text() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_list(&quoted("John,Jane"), &c).unwrap(),
            FilterValue::List(vec![
                Scalar::Text("John".to_string()),
                Scalar::Text("Jane".to_string())
            ])
        );
    }

    #[test]
    fn test_list_in_parentheses_with_quoted_elements() {
        let c = ctx(Tz::UTC);
        assert_eq!(
            coerce_list(&bare("('a b', 2)"), &c).unwrap(),
            FilterValue::List(vec![Scalar::Text("a b".to_string()), Scalar::Int(2)])
        );
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("").unwrap(), Tz::UTC);
        assert_eq!(
            parse_timezone("Europe/Berlin").unwrap(),
            chrono_tz::Europe::Berlin
        );
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(FilterError::InvalidTimezone { .. })
        ));
    }
}
