use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

/// Short relative time for build rows: `just now`, `5min ago`, `3hr ago`,
/// `2d ago`, then the calendar date.
pub fn compact_ago(now: DateTime<Utc>, t: Option<DateTime<Utc>>) -> String {
    let Some(t) = t else {
        return "unknown".to_string();
    };
    let secs = (now - t).num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}min ago", secs / 60),
        3600..=86_399 => format!("{}hr ago", secs / 3600),
        86_400..=604_799 => format!("{}d ago", secs / 86_400),
        _ => t.format("%b %-d").to_string(),
    }
}

/// Long relative time for resource details, e.g. `1 minute ago`.
pub fn long_ago(now: DateTime<Utc>, t: Option<DateTime<Utc>>) -> String {
    let Some(t) = t else {
        return "never".to_string();
    };
    let secs = (now - t).num_seconds().max(0);
    let (n, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3599 => (secs / 60, "minute"),
        3600..=86_399 => (secs / 3600, "hour"),
        86_400..=604_799 => (secs / 86_400, "day"),
        _ => (secs / 604_800, "week"),
    };
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Build duration; `unknown` until both ends are known.
pub fn build_duration(secs: Option<i64>) -> String {
    let Some(secs) = secs else {
        return "unknown".to_string();
    };
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}

pub fn timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        result.push(c);
        width += cw;
    }
    result.push('…');
    result
}
