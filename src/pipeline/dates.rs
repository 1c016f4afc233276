//! Date and time expression scanning.
//!
//! Finds calendar references ("2025-05-01 14:00", "May 1st", "tomorrow at
//! 3pm", "next Friday") in free text and resolves them against a reference
//! time, preferring future interpretations when a phrase is ambiguous.
//!
//! Results are ISO-8601 strings in order of appearance: `YYYY-MM-DD` for a
//! bare date, `YYYY-MM-DDTHH:MM:SS` when a time of day was found.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::{Captures, Regex};

/// Source of the reference time used to resolve relative phrases.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|sept|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";

static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2}))?)?")
        .expect("valid iso date regex")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid month-day regex")
});

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?\s+({MONTHS})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid day-month regex")
});

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").expect("valid numeric date regex")
});

static RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(day after tomorrow|today|tonight|tomorrow)\b")
        .expect("valid relative date regex")
});

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(next|this)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("valid weekday regex")
});

static MERIDIEM_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b\.?").expect("valid meridiem regex")
});

static CLOCK_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)(?::([0-5]\d))?\b").expect("valid clock time regex")
});

static NAMED_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(noon|midnight)\b").expect("valid named time regex"));

/// Text allowed between a date and the time attached to it.
static JOIN_GAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s,]*(?:(?:at|on|from|by)\s+|@\s*|-\s*)?$").expect("valid gap regex")
});

/// Text allowed between a weekday and an explicit date naming the same day.
static WEEKDAY_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s,]*$").expect("valid weekday gap regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateKind {
    Explicit,
    Relative,
    Weekday,
}

#[derive(Debug, Clone)]
struct DateSpan {
    start: usize,
    end: usize,
    date: NaiveDate,
    time: Option<NaiveTime>,
    kind: DateKind,
}

#[derive(Debug, Clone)]
struct TimeSpan {
    start: usize,
    end: usize,
    time: NaiveTime,
    used: bool,
}

/// Scan `text` for date/time expressions relative to `now`.
pub fn scan_dates(text: &str, now: NaiveDateTime) -> Vec<String> {
    let today = now.date();
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut dates: Vec<DateSpan> = Vec::new();

    collect_dates(&ISO_RE, text, &mut claimed, &mut dates, |c| {
        let date = NaiveDate::from_ymd_opt(num(c, 1)?, num(c, 2)?, num(c, 3)?)?;
        let time = match c.get(4) {
            Some(_) => Some(NaiveTime::from_hms_opt(
                num(c, 4)?,
                num(c, 5)?,
                c.get(6).map_or(Some(0), |_| num(c, 6))?,
            )?),
            None => None,
        };
        Some((date, time, DateKind::Explicit))
    });
    collect_dates(&MONTH_DAY_RE, text, &mut claimed, &mut dates, |c| {
        let month = month_number(c.get(1)?.as_str())?;
        let date = resolve_month_day(today, month, num(c, 2)?, num(c, 3))?;
        Some((date, None, DateKind::Explicit))
    });
    collect_dates(&DAY_MONTH_RE, text, &mut claimed, &mut dates, |c| {
        if is_modal_may(c) {
            return None;
        }
        let month = month_number(c.get(2)?.as_str())?;
        let date = resolve_month_day(today, month, num(c, 1)?, num(c, 3))?;
        Some((date, None, DateKind::Explicit))
    });
    collect_dates(&NUMERIC_RE, text, &mut claimed, &mut dates, |c| {
        let year = num::<i32>(c, 3).map(|y| if y < 100 { 2000 + y } else { y });
        let date = resolve_month_day(today, num(c, 1)?, num(c, 2)?, year)?;
        Some((date, None, DateKind::Explicit))
    });
    collect_dates(&RELATIVE_RE, text, &mut claimed, &mut dates, |c| {
        let offset = match c.get(1)?.as_str().to_lowercase().as_str() {
            "today" | "tonight" => 0,
            "tomorrow" => 1,
            _ => 2,
        };
        Some((today.checked_add_days(Days::new(offset))?, None, DateKind::Relative))
    });
    collect_dates(&WEEKDAY_RE, text, &mut claimed, &mut dates, |c| {
        let explicit_next = c
            .get(1)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("next"));
        let target = weekday_from_name(c.get(2)?.as_str())?;
        Some((next_weekday(today, target, explicit_next)?, None, DateKind::Weekday))
    });

    let mut times = collect_times(text, &mut claimed);

    drop_redundant_weekdays(text, &mut dates);
    dates.sort_by_key(|d| d.start);

    for span in dates.iter_mut().filter(|d| d.time.is_none()) {
        if let Some(time) = attach_time(text, span, &mut times) {
            span.time = Some(time);
        }
    }

    let mut resolved: Vec<(usize, String)> = dates
        .iter()
        .map(|d| (d.start, render(d.date, d.time)))
        .collect();

    // Times with no date of their own land on the next occurrence.
    for t in times.iter().filter(|t| !t.used) {
        let date = if t.time > now.time() {
            Some(today)
        } else {
            today.checked_add_days(Days::new(1))
        };
        if let Some(date) = date {
            resolved.push((t.start, render(date, Some(t.time))));
        }
    }

    resolved.sort_by_key(|(pos, _)| *pos);
    resolved.into_iter().map(|(_, iso)| iso).collect()
}

fn collect_dates<F>(
    re: &Regex,
    text: &str,
    claimed: &mut Vec<(usize, usize)>,
    out: &mut Vec<DateSpan>,
    resolve: F,
) where
    F: Fn(&Captures<'_>) -> Option<(NaiveDate, Option<NaiveTime>, DateKind)>,
{
    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if overlaps(claimed, m.start(), m.end()) {
            continue;
        }
        // Invalid calendar dates are skipped, not reported.
        if let Some((date, time, kind)) = resolve(&caps) {
            claimed.push((m.start(), m.end()));
            out.push(DateSpan {
                start: m.start(),
                end: m.end(),
                date,
                time,
                kind,
            });
        }
    }
}

fn collect_times(text: &str, claimed: &mut Vec<(usize, usize)>) -> Vec<TimeSpan> {
    let mut candidates: Vec<(usize, usize, Option<NaiveTime>)> = Vec::new();
    for c in MERIDIEM_TIME_RE.captures_iter(text) {
        if let Some(m) = c.get(0) {
            candidates.push((m.start(), m.end(), meridiem_time(&c)));
        }
    }
    for c in CLOCK_TIME_RE.captures_iter(text) {
        if let Some(m) = c.get(0) {
            candidates.push((m.start(), m.end(), clock_time(&c)));
        }
    }
    for m in NAMED_TIME_RE.find_iter(text) {
        let time = if m.as_str().eq_ignore_ascii_case("noon") {
            NaiveTime::from_hms_opt(12, 0, 0)
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)
        };
        candidates.push((m.start(), m.end(), time));
    }

    // Earlier patterns win overlaps, so claim in push order.
    let mut times = Vec::new();
    for (start, end, time) in candidates {
        if let Some(time) = time
            && !overlaps(claimed, start, end)
        {
            claimed.push((start, end));
            times.push(TimeSpan {
                start,
                end,
                time,
                used: false,
            });
        }
    }
    times.sort_by_key(|t| t.start);
    times
}

/// `3pm`, `10:30 a.m.`
fn meridiem_time(c: &Captures<'_>) -> Option<NaiveTime> {
    let hour: u32 = num(c, 1)?;
    let minute: u32 = c.get(2).map_or(Some(0), |_| num(c, 2))?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let is_pm = c.get(3)?.as_str().eq_ignore_ascii_case("p");
    let hour24 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

/// `14:00`, `09:15:30`
fn clock_time(c: &Captures<'_>) -> Option<NaiveTime> {
    let second = c.get(3).map_or(Some(0), |_| num(c, 3))?;
    NaiveTime::from_hms_opt(num(c, 1)?, num(c, 2)?, second)
}

/// "option 1 may work": lowercase "may" straight after a bare number is
/// the verb, not the month.
fn is_modal_may(c: &Captures<'_>) -> bool {
    let (Some(whole), Some(day), Some(month)) = (c.get(0), c.get(1), c.get(2)) else {
        return false;
    };
    month.as_str() == "may"
        && whole.as_str()[day.end() - whole.start()..month.start() - whole.start()]
            .trim()
            .is_empty()
}

/// "Friday, May 2" names one day; keep only the explicit date.
fn drop_redundant_weekdays(text: &str, dates: &mut Vec<DateSpan>) {
    let explicit: Vec<(usize, usize)> = dates
        .iter()
        .filter(|d| d.kind == DateKind::Explicit)
        .map(|d| (d.start, d.end))
        .collect();
    dates.retain(|d| {
        if d.kind != DateKind::Weekday {
            return true;
        }
        !explicit.iter().any(|&(start, end)| {
            (start >= d.end && WEEKDAY_GAP_RE.is_match(&text[d.end..start]))
                || (end <= d.start && WEEKDAY_GAP_RE.is_match(&text[end..d.start]))
        })
    });
}

/// Claim the nearest unused time adjacent to `span`, preferring one after it.
fn attach_time(text: &str, span: &DateSpan, times: &mut [TimeSpan]) -> Option<NaiveTime> {
    let after = times.iter().position(|t| {
        !t.used && t.start >= span.end && JOIN_GAP_RE.is_match(&text[span.end..t.start])
    });
    let before = || {
        times.iter().rposition(|t| {
            !t.used && t.end <= span.start && JOIN_GAP_RE.is_match(&text[t.end..span.start])
        })
    };
    let idx = after.or_else(before)?;
    times[idx].used = true;
    Some(times[idx].time)
}

fn render(date: NaiveDate, time: Option<NaiveTime>) -> String {
    match time {
        Some(t) => date.and_time(t).format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => date.format("%Y-%m-%d").to_string(),
    }
}

fn overlaps(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e)| start < e && s < end)
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    name.to_lowercase().parse().ok()
}

/// Month/day with an optional year. Without a year the next occurrence on or
/// after `today` is chosen.
fn resolve_month_day(
    today: NaiveDate,
    month: u32,
    day: u32,
    year: Option<i32>,
) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    // Feb 29 may be up to four years out.
    (0..=4).find_map(|offset| {
        NaiveDate::from_ymd_opt(today.year() + offset, month, day).filter(|d| *d >= today)
    })
}

/// Next date falling on `target`. A weekday equal to today's resolves to
/// today, or a week ahead when the text said "next".
fn next_weekday(today: NaiveDate, target: Weekday, explicit_next: bool) -> Option<NaiveDate> {
    let current = today.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let mut ahead = (wanted + 7 - current) % 7;
    if ahead == 0 && explicit_next {
        ahead = 7;
    }
    today.checked_add_days(Days::new(u64::from(ahead)))
}
