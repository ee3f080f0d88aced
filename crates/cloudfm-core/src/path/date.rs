//! Date-aware name ordering.
//!
//! Names such as `"15oct notes"` or `"Notes Nov-3"` embed a calendar day. Such
//! names sort chronologically among themselves (ignoring any year) and after
//! every undated name.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

const MONTH: &str = "(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?:(\d{{1,2}})[.\s\-_]?{MONTH}|{MONTH}[.\s\-_]?(\d{{1,2}}))\b"
    );
    // the pattern is a compile-time constant
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid date pattern: {e}"))
});

fn month_index(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    let idx = match &lower[..3.min(lower.len())] {
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
    Some(idx)
}

/// Extract `(month, day)` from the first date token in `name`.
pub fn parse_day_month(name: &str) -> Option<(u32, u32)> {
    let caps = DATE_TOKEN.captures(name)?;
    let (day, month) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
        (Some(d), Some(m), _, _) => (d.as_str(), m.as_str()),
        (_, _, Some(m), Some(d)) => (d.as_str(), m.as_str()),
        _ => return None,
    };
    let day: u32 = day.parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }
    Some((month_index(month)?, day))
}

/// Canonical ordering for folder and file listings.
///
/// Both dated: chronological. Exactly one dated: the dated name sorts after.
/// Neither dated: case-insensitive lexicographic. Ties fall back to exact
/// byte order so the ordering is total.
pub fn date_aware_compare(a: &str, b: &str) -> Ordering {
    let primary = match (parse_day_month(a), parse_day_month(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    };
    primary.then_with(|| a.cmp(b))
}
