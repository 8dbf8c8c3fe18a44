/// Follower-age durations for followers-only mode.
///
/// Settings hold free-form text such as `"2w"`, `"30m"`, `"5 days 12 hours"` or
/// `"2 days, 4:13:02"`.  [`normalize_follower_duration`] turns that text into the
/// whole number of minutes the platform expects, capped at 90 days.
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest follower age the platform accepts (90 days), in minutes.
pub const MAX_FOLLOWER_MINUTES: u32 = 129_600;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// `<number><optional whitespace><unit>` at the start of the remaining input.
static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)\s*([a-z]+\.?)").expect("term pattern is valid")
});

/// A number with no unit, interpreted as seconds.
static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+(?:\.\d*)?|\.\d+)$").expect("number pattern is valid"));

/// Seconds field of a clock expression (`SS` or `SS.fff`).
static CLOCK_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-5]\d(?:\.\d+)?$").expect("clock pattern is valid"));

#[derive(Debug, Error, PartialEq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("unknown time unit '{0}'")]
    UnknownUnit(String),
    #[error("time unit '{0}' is repeated or out of order")]
    MisplacedUnit(String),
    #[error("unexpected input at '{0}'")]
    Unexpected(String),
}

/// Time units, declared from largest to smallest.  Terms must appear in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Unit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let suffix = suffix.strip_suffix('.').unwrap_or(suffix);
        let unit = match suffix {
            "y" | "ys" | "yr" | "yrs" | "year" | "years" => Unit::Years,
            "mo" | "mos" | "mth" | "mths" | "month" | "months" => Unit::Months,
            "w" | "wk" | "wks" | "week" | "weeks" => Unit::Weeks,
            "d" | "dy" | "dys" | "day" | "days" => Unit::Days,
            "h" | "hr" | "hrs" | "hour" | "hours" => Unit::Hours,
            "m" | "min" | "mins" | "minute" | "minutes" => Unit::Minutes,
            "s" | "sec" | "secs" | "second" | "seconds" => Unit::Seconds,
            _ => return None,
        };
        Some(unit)
    }

    fn seconds(self) -> f64 {
        match self {
            Unit::Years => 365.0 * DAY,
            Unit::Months => 30.0 * DAY,
            Unit::Weeks => 7.0 * DAY,
            Unit::Days => DAY,
            Unit::Hours => HOUR,
            Unit::Minutes => MINUTE,
            Unit::Seconds => 1.0,
        }
    }
}

/// Parses a human duration expression into (possibly fractional, possibly negative) seconds.
///
/// Accepted forms, case-insensitive, with an optional leading `+`/`-`:
/// - unit terms from largest to smallest: `"1w3d2h32m"`, `"5 days 12 hours"`,
///   `"5 hrs, 34 mins, 56 secs"`, `"1.5 hours"`
/// - clock notation `:SS`, `M:SS`, `H:MM:SS`, `D:HH:MM:SS`, optionally after
///   day-or-larger terms: `"4:13"`, `"2 days, 4:13:02.266"`
/// - terms may be separated by whitespace around a single `,` or `/`, which must be
///   followed by another term
/// - a bare number of seconds: `"90"`
pub fn parse_duration_secs(text: &str) -> Result<f64, DurationError> {
    let lowered = text.trim().to_lowercase();
    let (sign, body) = match lowered.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, lowered.strip_prefix('+').unwrap_or(&lowered)),
    };
    let body = body.trim_start();
    if body.is_empty() {
        return Err(DurationError::Empty);
    }

    if BARE_NUMBER.is_match(body) {
        return parse_number(body).map(|secs| sign * secs);
    }

    let mut total = 0.0;
    let mut previous: Option<Unit> = None;
    let mut rest = body;

    loop {
        if let Some(caps) = TERM.captures(rest) {
            let suffix = &caps[2];
            let unit = Unit::from_suffix(suffix)
                .ok_or_else(|| DurationError::UnknownUnit(suffix.to_string()))?;
            if previous.is_some_and(|prev| unit <= prev) {
                return Err(DurationError::MisplacedUnit(suffix.to_string()));
            }
            total += parse_number(&caps[1])? * unit.seconds();
            previous = Some(unit);
            rest = &rest[caps[0].len()..];
        } else if clock_allowed_after(previous) {
            // A clock always closes the expression.
            total += parse_clock(rest).ok_or_else(|| DurationError::Unexpected(rest.to_string()))?;
            rest = "";
        } else {
            return Err(DurationError::Unexpected(rest.to_string()));
        }

        if rest.is_empty() {
            break;
        }
        let next = skip_separator(rest);
        if next.is_empty() {
            return Err(DurationError::Unexpected(rest.to_string()));
        }
        rest = next;
    }

    Ok(sign * total)
}

/// Converts free-form follower-duration text into whole minutes.
///
/// Empty text means "no explicit duration" and yields `None`.  Unparsable text is
/// logged and also yields `None`.  Parsed values are floored to whole minutes and
/// clamped to `0..=MAX_FOLLOWER_MINUTES`.
pub fn normalize_follower_duration(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }
    match parse_duration_secs(text) {
        Ok(secs) => Some(clamp_minutes(secs)),
        Err(e) => {
            tracing::error!("Failed to parse time from {text:?}: {e}");
            None
        }
    }
}

fn clamp_minutes(secs: f64) -> u32 {
    let minutes = (secs / MINUTE).floor();
    if minutes.is_nan() {
        return 0;
    }
    minutes.clamp(0.0, f64::from(MAX_FOLLOWER_MINUTES)) as u32
}

fn clock_allowed_after(previous: Option<Unit>) -> bool {
    previous.map_or(true, |prev| prev < Unit::Hours)
}

/// Skips the gap between two terms: whitespace around at most one `,` or `/`.
fn skip_separator(s: &str) -> &str {
    let s = s.trim_start();
    s.strip_prefix(|c: char| c == ',' || c == '/')
        .unwrap_or(s)
        .trim_start()
}

fn parse_number(s: &str) -> Result<f64, DurationError> {
    s.parse::<f64>()
        .map_err(|_| DurationError::Unexpected(s.to_string()))
}

/// Parses `:SS`, `M:SS`, `H:MM:SS` or `D:HH:MM:SS` (seconds may carry a fraction).
fn parse_clock(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=4).contains(&parts.len()) {
        return None;
    }
    let (secs, larger) = parts.split_last()?;
    if !CLOCK_SECONDS.is_match(secs) {
        return None;
    }

    let mut total: f64 = secs.parse().ok()?;
    if larger == [""] {
        return Some(total);
    }

    // Fields right to left: minutes, hours, days.
    let weights = [MINUTE, HOUR, DAY];
    for (i, field) in larger.iter().rev().enumerate() {
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value: f64 = field.parse().ok()?;
        let leftmost = i + 1 == larger.len();
        let valid = match i {
            0 if leftmost => field.len() <= 2,
            0 => field.len() == 2 && value < 60.0,
            1 if leftmost => true,
            1 => field.len() == 2 && value < 24.0,
            _ => true,
        };
        if !valid {
            return None;
        }
        total += value * weights[i];
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── normalize_follower_duration ───────────────────────────────────────────

    #[test]
    fn empty_text_is_absent() {
        assert_eq!(normalize_follower_duration(""), None);
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(normalize_follower_duration("not a duration"), None);
        assert_eq!(normalize_follower_duration("   "), None);
        assert_eq!(normalize_follower_duration("5 parsecs"), None);
    }

    #[test]
    fn common_phrasings() {
        assert_eq!(normalize_follower_duration("30m"), Some(30));
        assert_eq!(normalize_follower_duration("1 week"), Some(10_080));
        assert_eq!(normalize_follower_duration("5 days 12 hours"), Some(7_920));
        assert_eq!(normalize_follower_duration("2w"), Some(20_160));
    }

    #[test]
    fn clamps_to_ninety_days() {
        assert_eq!(normalize_follower_duration("10 years"), Some(MAX_FOLLOWER_MINUTES));
        assert_eq!(normalize_follower_duration("3 months"), Some(MAX_FOLLOWER_MINUTES));
        assert_eq!(
            normalize_follower_duration("99999999999999999999999999 weeks"),
            Some(MAX_FOLLOWER_MINUTES)
        );
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_eq!(normalize_follower_duration("-5m"), Some(0));
        assert_eq!(normalize_follower_duration("- 3 days"), Some(0));
    }

    #[test]
    fn partial_minutes_are_floored() {
        assert_eq!(normalize_follower_duration("59s"), Some(0));
        assert_eq!(normalize_follower_duration("90"), Some(1));
        assert_eq!(normalize_follower_duration("2 days, 4:13:02"), Some(3_133));
    }

    #[test]
    fn repeated_calls_agree() {
        for input in ["", "30m", "garbage", "10 years", "1.5 hours"] {
            assert_eq!(
                normalize_follower_duration(input),
                normalize_follower_duration(input)
            );
        }
    }

    #[test]
    fn results_stay_in_range() {
        let inputs = [
            "0", "1s", "-1s", "1 year", "-10 years", "4:13", "2:04:13:02.5", "1.2.3m",
            "12 mos", "52wk", "100000000000000000000000000000000000000 y", ".5h",
        ];
        for input in inputs {
            if let Some(minutes) = normalize_follower_duration(input) {
                assert!(minutes <= MAX_FOLLOWER_MINUTES, "{input} -> {minutes}");
            }
        }
    }

    // ── parse_duration_secs ───────────────────────────────────────────────────

    #[test]
    fn compact_terms() {
        assert_eq!(parse_duration_secs("1h30m"), Ok(5_400.0));
        assert_eq!(parse_duration_secs("5hr34m56s"), Ok(20_096.0));
        assert_eq!(
            parse_duration_secs("1w3d2h32m"),
            Ok(10.0 * DAY + 2.0 * HOUR + 32.0 * MINUTE)
        );
    }

    #[test]
    fn separated_terms() {
        assert_eq!(
            parse_duration_secs("5 hours, 34 minutes, 56 seconds"),
            Ok(20_096.0)
        );
        assert_eq!(parse_duration_secs("1 d / 1 h"), Ok(DAY + HOUR));
    }

    #[test]
    fn fractional_and_case_insensitive() {
        assert_eq!(parse_duration_secs("1.5 Hours"), Ok(5_400.0));
        assert_eq!(parse_duration_secs(".5H"), Ok(1_800.0));
        assert_eq!(parse_duration_secs("2W"), Ok(14.0 * DAY));
    }

    #[test]
    fn month_and_year_units() {
        assert_eq!(parse_duration_secs("1 mo"), Ok(30.0 * DAY));
        assert_eq!(parse_duration_secs("3 yrs."), Ok(3.0 * 365.0 * DAY));
        assert_eq!(parse_duration_secs("1y 1mo"), Ok(395.0 * DAY));
    }

    #[test]
    fn clock_forms() {
        assert_eq!(parse_duration_secs("4:13"), Ok(253.0));
        assert_eq!(parse_duration_secs("1:30:00"), Ok(5_400.0));
        assert_eq!(parse_duration_secs("2:04:13:02"), Ok(2.0 * DAY + 15_182.0));
        assert_eq!(parse_duration_secs("0:00.5"), Ok(0.5));
        assert_eq!(parse_duration_secs(":05"), Ok(5.0));
        assert_eq!(parse_duration_secs("100:00:00"), Ok(100.0 * HOUR));
    }

    #[test]
    fn clock_fields_out_of_range_are_rejected() {
        assert!(parse_duration_secs("123:00").is_err());
        assert!(parse_duration_secs("1:60").is_err());
        assert!(parse_duration_secs("1:99").is_err());
        assert!(parse_duration_secs("1:60:00").is_err());
        assert!(parse_duration_secs("1:24:00:00").is_err());
        assert!(parse_duration_secs("1:5:00").is_err());
        assert_eq!(normalize_follower_duration("123:00"), None);
    }

    #[test]
    fn clock_after_hours_is_rejected() {
        assert!(matches!(
            parse_duration_secs("2 hours 4:13"),
            Err(DurationError::Unexpected(_))
        ));
    }

    #[test]
    fn out_of_order_units_are_rejected() {
        assert_eq!(
            parse_duration_secs("30 minutes 2 hours"),
            Err(DurationError::MisplacedUnit("hours".to_string()))
        );
        assert_eq!(
            parse_duration_secs("1d 2d"),
            Err(DurationError::MisplacedUnit("d".to_string()))
        );
    }

    #[test]
    fn unknown_units_and_trailing_text_are_rejected() {
        assert_eq!(
            parse_duration_secs("5 parsecs"),
            Err(DurationError::UnknownUnit("parsecs".to_string()))
        );
        assert!(parse_duration_secs("30 minutes and change").is_err());
        assert!(parse_duration_secs("1.2.3m").is_err());
        assert!(parse_duration_secs("inf").is_err());
    }

    #[test]
    fn separators_need_terms_on_both_sides() {
        for input in ["/", ",", ", /", "1h,", "1 week,", "1d //1h", ",1h"] {
            assert!(
                matches!(parse_duration_secs(input), Err(DurationError::Unexpected(_))),
                "{input:?} should be rejected"
            );
        }
        assert_eq!(normalize_follower_duration("/"), None);
        assert_eq!(normalize_follower_duration("1 week,"), None);
    }

    #[test]
    fn sign_only_is_empty() {
        assert_eq!(parse_duration_secs("-"), Err(DurationError::Empty));
        assert_eq!(parse_duration_secs(""), Err(DurationError::Empty));
    }
}
