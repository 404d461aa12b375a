use std::cmp::Ordering;

use chrono::NaiveDate;

/// Display format for calendar days, e.g. "Mar 05, 2024"
const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";

/// Check whether a string starts with an ISO calendar day (`YYYY-MM-DD`).
/// Anything may follow the day, so full timestamps match too.
pub fn looks_like_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// Parse the calendar day at the start of an ISO date or timestamp.
/// Returns None for anything that is not a real date ("2024-13-45").
pub fn parse_calendar_day(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if !looks_like_iso_date(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(&trimmed[..10], "%Y-%m-%d").ok()
}

/// Format a date string to a more readable format.
/// Unparseable input is returned as-is.
pub fn format_date(date: &str) -> String {
    match parse_calendar_day(date) {
        Some(day) => day.format(DISPLAY_DATE_FORMAT).to_string(),
        None => date.to_string(),
    }
}

/// Turn a backend field key into a display label.
///
/// `paidAmount` becomes "Paid Amount", `proposerID` becomes "Proposer ID"
/// and `aadhar_no` becomes "Aadhar no". Runs of capitals stay together
/// until the last capital that starts a new lowercase word.
pub fn humanize_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            let starts_word = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if starts_word && !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        }

        out.push(c);
    }

    let trimmed = out.trim_end();
    let mut label = trimmed.chars();
    match label.next() {
        Some(first) => first.to_uppercase().chain(label).collect(),
        None => String::new(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Case-insensitive substring check.
/// The needle should already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Case-insensitive ordering without allocating
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
