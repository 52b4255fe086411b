//! Display formatting for dates and links
//!
//! Resume items store their period as a single display string
//! (`"Jan 2022 – Mar 2024"`) and links as `{label, href}` objects. Tool
//! callers supply ISO-ish dates and bare strings, so everything passes
//! through here before it reaches a document.

use chrono::NaiveDate;
use serde_json::{json, Value};

/// Separator between the start and end of a date range (en dash).
pub const RANGE_SEPARATOR: &str = " – ";

/// Label used when a range has no end.
pub const PRESENT: &str = "Present";

/// Format an input date as `Mon YYYY`.
///
/// Accepts `YYYY-MM` and `YYYY-MM-DD`. A bare `YYYY` is returned unchanged.
/// Returns `None` for anything else.
pub fn format_month(input: &str) -> Option<String> {
    let input = input.trim();
    match input.len() {
        4 if input.chars().all(|c| c.is_ascii_digit()) => Some(input.to_string()),
        7 => NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d")
            .ok()
            .map(|d| d.format("%b %Y").to_string()),
        10 => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .map(|d| d.format("%b %Y").to_string()),
        _ => None,
    }
}

/// Whether an end date means "still ongoing".
pub fn is_present_marker(input: &str) -> bool {
    matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "present" | "current" | "now" | "ongoing"
    )
}

/// Split a rendered `date` back into its start and end.
///
/// A `Present` end comes back as `None`. A date without the range
/// separator is treated as a start only.
///
/// ```
/// use resume_core::format::split_date_range;
///
/// assert_eq!(
///     split_date_range("Jan 2022 – Present"),
///     (Some("Jan 2022".to_string()), None)
/// );
/// ```
pub fn split_date_range(date: &str) -> (Option<String>, Option<String>) {
    let part = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    match date.split_once(RANGE_SEPARATOR.trim()) {
        Some((start, end)) => {
            let end = part(end).filter(|e| !is_present_marker(e));
            (part(start), end)
        }
        None => (part(date).filter(|d| !is_present_marker(d)), None),
    }
}

/// Build the display string for a date range.
///
/// Unparseable dates are used verbatim so free-form input like
/// `"Summer 2020"` still survives. A missing or "present" end renders as
/// `Present`. Returns `None` when neither end is supplied.
///
/// # Examples
///
/// ```
/// use resume_core::format::format_date_range;
///
/// assert_eq!(
///     format_date_range(Some("2022-01"), Some("2024-03")).as_deref(),
///     Some("Jan 2022 – Mar 2024")
/// );
/// assert_eq!(
///     format_date_range(Some("2022-01"), None).as_deref(),
///     Some("Jan 2022 – Present")
/// );
/// ```
pub fn format_date_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());

    let render = |s: &str| format_month(s).unwrap_or_else(|| s.to_string());

    match (start, end) {
        (None, None) => None,
        (None, Some(end)) if is_present_marker(end) => Some(PRESENT.to_string()),
        (None, Some(end)) => Some(render(end)),
        (Some(start), end) => {
            let end = match end {
                Some(end) if !is_present_marker(end) => render(end),
                _ => PRESENT.to_string(),
            };
            Some(format!("{}{}{}", render(start), RANGE_SEPARATOR, end))
        }
    }
}

/// Prefix `https://` when a link has no scheme.
pub fn ensure_scheme(href: &str) -> String {
    let href = href.trim();
    if href.is_empty() || href.contains("://") || href.starts_with("mailto:") {
        href.to_string()
    } else {
        format!("https://{}", href)
    }
}

/// An empty `{label, href}` link.
pub fn empty_url() -> Value {
    json!({ "label": "", "href": "" })
}

/// Normalize any link representation to `{label, href}`.
///
/// - `null` or non-string scalars become an empty link
/// - a bare string becomes `{label: "", href}` with a scheme added
/// - an object keeps its `label` and takes `href` (or `url`) as the target
pub fn normalize_url(value: &Value) -> Value {
    match value {
        Value::String(s) => json!({ "label": "", "href": ensure_scheme(s) }),
        Value::Object(map) => {
            let label = map.get("label").and_then(Value::as_str).unwrap_or("");
            let href = map
                .get("href")
                .or_else(|| map.get("url"))
                .and_then(Value::as_str)
                .unwrap_or("");
            json!({ "label": label, "href": ensure_scheme(href) })
        }
        _ => empty_url(),
    }
}
