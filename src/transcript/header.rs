//! Message header recognition and timestamp parsing.
//!
//! WhatsApp exports vary by locale and platform. One header rule covers the
//! two layouts, with any date order and 12h or 24h clocks:
//!
//! - iOS: `[1/15/24, 10:30:45 AM] Sender: Message`
//! - Android: `15/01/2024, 10:30 - Sender: Message`
//! - RU/DE: `15.01.2024, 10:30 - Sender: Message`
//! - ISO-like: `2024-01-15 10:30 - Sender: Message`
//!
//! AM/PM may be preceded by a regular, no-break or narrow no-break space.
//! The captured timestamp is kept verbatim; [`parse_timestamp`] only derives
//! a best-effort `NaiveDateTime` from it.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

const DATE: &str = r"\d{1,4}[./-]\d{1,2}[./-]\d{1,4}";
const TIME: &str = r"\d{1,2}[:.]\d{2}(?:[:.]\d{2})?(?:[\s\x{202F}\x{00A0}]*(?i:[ap])\.?\s?(?i:m)\.?)?";

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^[\x{{200E}}\x{{200F}}\x{{FEFF}}]?(?:\[(?P<bracketed>{DATE},?\s+{TIME})\]\s*|(?P<dashed>{DATE},?\s+{TIME})\s+[-\x{{2013}}]\s+)(?P<author>[^:]+?):\s?(?P<content>.*)$"
    );
    Regex::new(&pattern).expect("header pattern is valid")
});

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<a>\d{1,4})(?P<sep>[./-])(?P<b>\d{1,2})[./-](?P<c>\d{1,4}),?\s+(?P<hour>\d{1,2})[:.](?P<minute>\d{2})(?:[:.](?P<second>\d{2}))?(?:[\s\x{202F}\x{00A0}]*(?P<meridiem>(?i:[ap]))\.?\s?(?i:m)\.?)?$",
    )
    .expect("timestamp pattern is valid")
});

/// A recognized message header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub timestamp: &'a str,
    pub author: &'a str,
    pub content: &'a str,
}

/// Matches a line against the header rule.
///
/// Returns `None` for continuation lines, including header-shaped lines
/// without an author (system notices such as "Messages and calls are
/// end-to-end encrypted").
pub fn match_header(line: &str) -> Option<Header<'_>> {
    let caps = HEADER.captures(line)?;
    let timestamp = caps.name("bracketed").or_else(|| caps.name("dashed"))?;
    let author = caps.name("author")?.as_str().trim();
    if author.is_empty() {
        return None;
    }
    let content = caps.name("content").map_or("", |m| m.as_str());

    Some(Header {
        timestamp: timestamp.as_str(),
        author,
        content,
    })
}

/// Order of the day, month and year fields in exported dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `15/01/2024`, `15.01.24`
    DayFirst,
    /// `1/15/24`
    MonthFirst,
    /// `2024-01-15`
    YearFirst,
}

#[derive(Debug, Clone, Copy)]
struct TimestampParts {
    a: u32,
    b: u32,
    c: u32,
    a_width: usize,
    c_width: usize,
    separator: char,
    hour: u32,
    minute: u32,
    second: u32,
    pm: Option<bool>,
}

fn split_timestamp(timestamp: &str) -> Option<TimestampParts> {
    let caps = TIMESTAMP.captures(timestamp.trim())?;
    let num = |name: &str| -> Option<u32> { caps.name(name)?.as_str().parse().ok() };

    Some(TimestampParts {
        a: num("a")?,
        b: num("b")?,
        c: num("c")?,
        a_width: caps.name("a")?.as_str().len(),
        c_width: caps.name("c")?.as_str().len(),
        separator: caps.name("sep")?.as_str().chars().next()?,
        hour: num("hour")?,
        minute: num("minute")?,
        second: num("second").unwrap_or(0),
        pm: caps
            .name("meridiem")
            .map(|m| m.as_str().eq_ignore_ascii_case("p")),
    })
}

/// Detects the date order by scoring every timestamp of a transcript.
///
/// A field greater than 12 can only be a day, which decides the order. When
/// no timestamp is decisive the separator and year width of the first one
/// pick the locale default: `/` with a two-digit year is US month-first,
/// everything else is day-first. Returns `None` if nothing parses.
pub fn detect_date_order<'a>(timestamps: impl IntoIterator<Item = &'a str>) -> Option<DateOrder> {
    let mut day_first = 0usize;
    let mut month_first = 0usize;
    let mut year_first = 0usize;
    let mut fallback = None;

    for ts in timestamps {
        let Some(parts) = split_timestamp(ts) else {
            continue;
        };

        if fallback.is_none() {
            fallback = Some(if parts.a_width == 4 {
                DateOrder::YearFirst
            } else if parts.separator == '/' && parts.c_width <= 2 {
                DateOrder::MonthFirst
            } else {
                DateOrder::DayFirst
            });
        }

        if parts.a_width == 4 {
            year_first += 1;
        } else if parts.a > 12 {
            day_first += 1;
        } else if parts.b > 12 {
            month_first += 1;
        }
    }

    let scores = [
        (year_first, DateOrder::YearFirst),
        (day_first, DateOrder::DayFirst),
        (month_first, DateOrder::MonthFirst),
    ];
    let (best, order) = scores
        .iter()
        .copied()
        .max_by_key(|(score, _)| *score)
        .unwrap_or((0, DateOrder::DayFirst));

    if best == 0 { fallback } else { Some(order) }
}

/// Parses a raw timestamp using the given date order.
///
/// Two-digit years are taken as 20xx. Returns `None` for anything that does
/// not form a valid calendar date and time.
pub fn parse_timestamp(timestamp: &str, order: DateOrder) -> Option<NaiveDateTime> {
    let p = split_timestamp(timestamp)?;

    let (year, month, day) = match order {
        DateOrder::DayFirst => (p.c, p.b, p.a),
        DateOrder::MonthFirst => (p.c, p.a, p.b),
        DateOrder::YearFirst => (p.a, p.b, p.c),
    };
    let year = if year < 100 { year + 2000 } else { year };

    let hour = match p.pm {
        Some(true) if p.hour < 12 => p.hour + 12,
        Some(false) if p.hour == 12 => 0,
        _ => p.hour,
    };

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, p.minute, p.second)?;
    Some(date.and_time(time))
}
