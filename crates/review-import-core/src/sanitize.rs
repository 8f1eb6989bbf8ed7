//! Field-level clean-up and validation for imported rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::net::IpAddr;
use std::sync::OnceLock;
use tracing::debug;

pub const MIN_STAR_RATING: u32 = 1;
pub const MAX_STAR_RATING: u32 = 5;

/// Markup that survives in review bodies
const ALLOWED_REVIEW_TAGS: [&str; 2] = ["br", "p"];

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$",
        )
        .unwrap_or_else(|e| panic!("email pattern is invalid: {}", e))
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Quoted attribute values may contain '>'
        Regex::new(r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)\b(?:"[^"]*"|'[^']*'|[^>])*>"#)
            .unwrap_or_else(|e| panic!("tag pattern is invalid: {}", e))
    })
}

/// Integer value of a rating cell: leading digits, sign dropped, 0 if none
pub fn coerce_rating(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();

    match digits.parse::<u64>() {
        Ok(value) => u32::try_from(value).unwrap_or(u32::MAX),
        Err(_) if digits.is_empty() => 0,
        Err(_) => u32::MAX,
    }
}

/// Rating in 1..=5, or None when the cell is out of range or not a number
pub fn validate_star_rating(raw: &str) -> Option<u8> {
    let rating = coerce_rating(raw);
    if (MIN_STAR_RATING..=MAX_STAR_RATING).contains(&rating) {
        u8::try_from(rating).ok()
    } else {
        None
    }
}

/// Strip characters an address may not contain.
///
/// Returns an empty string when nothing usable is left.
pub fn sanitize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return String::new();
    };

    let local: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(*c))
        .collect();
    if local.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = domain
        .split('.')
        .map(|label| {
            label
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .trim_matches('-')
                .to_string()
        })
        .filter(|label| !label.is_empty())
        .collect();
    if labels.len() < 2 {
        return String::new();
    }

    format!("{}@{}", local, labels.join("."))
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() >= 6 && email_regex().is_match(email)
}

/// Turn newlines into `<br />` and drop every tag except `<br>` and `<p>`.
///
/// Kept tags lose their attributes; the text inside removed tags stays.
pub fn sanitize_review_text(text: &str) -> String {
    let with_breaks = insert_line_breaks(text);

    tag_regex()
        .replace_all(&with_breaks, |caps: &Captures| {
            let Some(name) = caps.get(2) else {
                return String::new(); // comment
            };
            let name = name.as_str().to_ascii_lowercase();
            if !ALLOWED_REVIEW_TAGS.contains(&name.as_str()) {
                return String::new();
            }
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            match (name.as_str(), closing) {
                ("br", _) => "<br />".to_string(),
                (_, true) => format!("</{}>", name),
                (_, false) => format!("<{}>", name),
            }
        })
        .into_owned()
}

/// `<br />` before every line break; `\r\n` and `\n\r` count as one break
fn insert_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\r' && c != '\n' {
            out.push(c);
            continue;
        }
        out.push_str("<br />");
        out.push(c);
        let pair = if c == '\r' { '\n' } else { '\r' };
        if let Some(next) = chars.next_if_eq(&pair) {
            out.push(next);
        }
    }
    out
}

/// The row's IP when it parses, otherwise the configured fallback
pub fn resolve_author_ip(raw: Option<&str>, fallback: &str) -> String {
    match raw.map(str::trim).filter(|ip| !ip.is_empty()) {
        Some(ip) if ip.parse::<IpAddr>().is_ok() => ip.to_string(),
        _ => fallback.to_string(),
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a review date into the host's timezone-naive form.
///
/// The wall-clock time written in the cell is kept and any zone is dropped.
/// Blank or unparseable values fall back to `now`.
pub fn parse_review_date(raw: Option<&str>, now: NaiveDateTime) -> NaiveDateTime {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return now;
    };

    match parse_datetime(value) {
        Some(parsed) => parsed,
        None => {
            debug!(value, "Unparseable review date, using import time");
            now
        }
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S %:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local());
        }
    }

    // "2024-01-15 10:30:00 UTC" style: drop a trailing zone abbreviation
    let without_zone = match value.rsplit_once(' ') {
        Some((head, zone)) if zone.chars().all(|c| c.is_ascii_alphabetic()) => head.trim_end(),
        _ => value,
    };

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(without_zone, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Username candidate from an email's local part: letters, digits, `_ . - @` and spaces
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let cleaned: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ' '))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
