//! Derived display values shared by all pages.
//!
//! Everything here is a pure function over row data. Page templates call these
//! instead of formatting inline so that the same trip shows the same date range
//! on the homepage, the trips listing and the trip page.

use crate::dates::JournalDate;
use chrono::NaiveDate;

/// Offset from an ASCII uppercase letter to its regional indicator symbol
/// (`'A'` = 65 → U+1F1E6).
const REGIONAL_INDICATOR_OFFSET: u32 = 127_397;

/// Format a trip or country date span as `"Mon YYYY – Mon YYYY"`.
///
/// One-sided spans read `"From Mon YYYY"` / `"Until Mon YYYY"`; an empty span
/// is the empty string so templates can skip it.
pub fn format_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let fmt = |d: NaiveDate| d.format("%b %Y").to_string();
    match (start, end) {
        (Some(s), Some(e)) => format!("{} \u{2013} {}", fmt(s), fmt(e)),
        (Some(s), None) => format!("From {}", fmt(s)),
        (None, Some(e)) => format!("Until {}", fmt(e)),
        (None, None) => String::new(),
    }
}

/// [`format_date_range`] over optional backend dates.
pub fn journal_date_range(start: Option<&JournalDate>, end: Option<&JournalDate>) -> String {
    format_date_range(start.map(JournalDate::date), end.map(JournalDate::date))
}

/// Map an ISO 3166 alpha-2 code to its flag emoji.
///
/// Each character is uppercased and shifted into the regional indicator block,
/// so `"DE"` and `"de"` both give 🇩🇪. The mapping is per character and keeps
/// order; non-letters are shifted too, which yields unassigned code points
/// rather than an error.
pub fn country_code_to_flag(code: &str) -> String {
    code.chars()
        .flat_map(char::to_uppercase)
        .filter_map(|c| char::from_u32(c as u32 + REGIONAL_INDICATOR_OFFSET))
        .collect()
}

/// Format a count with thousands separators: `1234` → `"1,234"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Post date as shown on cards: `"3 May 2019"`.
pub fn format_post_date(date: &JournalDate) -> String {
    date.date().format("%-d %b %Y").to_string()
}

/// Join at most `max` names with `" · "`, noting how many were left out.
///
/// ```text
/// ["Peru", "Chile"], 5            → "Peru · Chile"
/// [a, b, c, d, e, f, g], 5        → "a · b · c · d · e · +2 more"
/// ```
pub fn country_summary(names: &[String], max: usize) -> String {
    let shown = names
        .iter()
        .take(max)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" \u{b7} ");
    if names.len() > max {
        format!("{} \u{b7} +{} more", shown, names.len() - max)
    } else {
        shown
    }
}

/// Two-digit row number used in trip listings (`0` → `"01"`).
pub fn row_number(index: usize) -> String {
    format!("{:02}", index + 1)
}
