//! Natural-language dates and lengths for the event commands.

use anyhow::{Context, Result, anyhow};
use calgrid_core::dates::{local_midnight, localize};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// A parsed date input: a whole day, or a wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Day(NaiveDate),
    At(NaiveDateTime),
}

impl When {
    pub fn parse(input: &str) -> Result<When> {
        let trimmed = input.trim();
        for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(When::At(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(When::Day(date));
        }

        let expanded = expand_abbreviations(input);
        let dt = fuzzydate::parse(&expanded)
            .map_err(|_| anyhow!("Could not parse date/time: \"{}\"", input))?;

        if mentions_time(input) {
            Ok(When::At(dt))
        } else {
            Ok(When::Day(dt.date()))
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            When::Day(date) => *date,
            When::At(dt) => dt.date(),
        }
    }

    /// As a start: the beginning of the day, or the given time.
    pub fn start(&self, tz: &Tz) -> DateTime<Utc> {
        match self {
            When::Day(date) => local_midnight(*date, tz),
            When::At(dt) => localize(*dt, tz),
        }
    }

    /// As an end: a bare day runs through to its end.
    pub fn end(&self, tz: &Tz) -> DateTime<Utc> {
        match self {
            When::Day(date) => local_midnight(*date + Duration::days(1), tz),
            When::At(dt) => localize(*dt, tz),
        }
    }

    /// Length used when no end is given.
    pub fn default_length(&self) -> Duration {
        match self {
            When::Day(_) => Duration::days(1),
            When::At(_) => Duration::hours(1),
        }
    }
}

pub fn parse_length(input: &str) -> Result<Duration> {
    let std_dur = humantime::parse_duration(input.trim())
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    Duration::from_std(std_dur).context("Duration too large")
}

/// An end given either as a length after `start` or as a date/time,
/// optionally prefixed with "until" or "to".
pub fn parse_end(input: &str, start: DateTime<Utc>, tz: &Tz) -> Result<DateTime<Utc>> {
    if let Ok(length) = parse_length(input) {
        return Ok(start + length);
    }

    let cleaned = input
        .strip_prefix("until ")
        .or_else(|| input.strip_prefix("to "))
        .unwrap_or(input);

    Ok(When::parse(cleaned)?.end(tz))
}

/// fuzzydate only knows full day and month names.
fn expand_abbreviations(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| match word {
            "mon" => "monday",
            "tue" | "tues" => "tuesday",
            "wed" => "wednesday",
            "thu" | "thur" | "thurs" => "thursday",
            "fri" => "friday",
            "sat" => "saturday",
            "sun" => "sunday",
            "jan" => "january",
            "feb" => "february",
            "mar" => "march",
            "apr" => "april",
            "jun" => "june",
            "jul" => "july",
            "aug" => "august",
            "sep" | "sept" => "september",
            "oct" => "october",
            "nov" => "november",
            "dec" => "december",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// "9am", "11:30pm", "15:00"
fn is_clock(word: &str) -> bool {
    let bare = word
        .strip_suffix("am")
        .or_else(|| word.strip_suffix("pm"));
    if let Some(bare) = bare {
        return bare.split(':').all(is_number);
    }

    word.split_once(':')
        .is_some_and(|(hours, minutes)| is_number(hours) && is_number(minutes))
}

/// Whether the input names a time of day rather than just a date.
fn mentions_time(input: &str) -> bool {
    let lower = input.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    words.iter().enumerate().any(|(i, word)| {
        let prev = i.checked_sub(1).map(|p| words[p]);
        let next = words.get(i + 1).copied();

        matches!(*word, "noon" | "midnight")
            || is_clock(word)
            || (matches!(*word, "am" | "pm") && prev.is_some_and(is_number))
            || (*word == "at" && next.is_some_and(|n| n.starts_with(|c: char| c.is_ascii_digit())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn recognizes_times() {
        assert!(mentions_time("tomorrow 6pm"));
        assert!(mentions_time("sat 3 pm"));
        assert!(mentions_time("9AM"));
        assert!(mentions_time("march 20 9:30"));
        assert!(mentions_time("friday noon"));
        assert!(mentions_time("tomorrow at 3"));
    }

    #[test]
    fn dates_alone_are_not_times() {
        assert!(!mentions_time("tomorrow"));
        assert!(!mentions_time("next friday"));
        assert!(!mentions_time("december"));
        assert!(!mentions_time("camp"));
        assert!(!mentions_time("am"));
    }

    #[test]
    fn expands_short_names() {
        assert_eq!(expand_abbreviations("Sat 3pm"), "saturday 3pm");
        assert_eq!(expand_abbreviations("sept 5"), "september 5");
        assert_eq!(expand_abbreviations("next  friday"), "next friday");
    }

    #[test]
    fn parses_day_and_time() {
        assert!(matches!(When::parse("tomorrow 3pm").unwrap(), When::At(_)));

        let day = When::parse("march 20").unwrap();
        assert!(matches!(day, When::Day(_)));
        assert_eq!((day.date().month(), day.date().day()), (3, 20));

        assert!(When::parse("not a date at all xyz").is_err());
    }

    #[test]
    fn parses_exact_formats() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 20)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        assert_eq!(When::parse("2025-03-20 15:30").unwrap(), When::At(at));
        assert_eq!(When::parse("2025-03-20T15:30").unwrap(), When::At(at));
        assert_eq!(
            When::parse(" 2025-03-20 ").unwrap(),
            When::Day(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap())
        );
    }

    #[test]
    fn day_spans_whole_day() {
        let day = When::Day(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
        let tz = chrono_tz::Europe::Oslo;

        assert_eq!(day.start(&tz), Utc.with_ymd_and_hms(2026, 3, 19, 23, 0, 0).unwrap());
        assert_eq!(day.end(&tz) - day.start(&tz), Duration::days(1));
        assert_eq!(day.default_length(), Duration::days(1));
    }

    #[test]
    fn end_as_length_or_date() {
        let start = Utc.with_ymd_and_hms(2026, 3, 20, 15, 0, 0).unwrap();

        assert_eq!(
            parse_end("45m", start, &Tz::UTC).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 20, 15, 45, 0).unwrap()
        );
        assert_eq!(parse_length("2h").unwrap(), Duration::hours(2));
        assert!(parse_end("until tomorrow 5pm", start, &Tz::UTC).is_ok());
        assert!(parse_length("soon").is_err());
    }
}
