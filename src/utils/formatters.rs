//! Display formatting for commit ids and timestamps.

/// Formats a commit id for display (first 7 characters).
#[must_use]
pub fn short_id(commit_id: &str) -> &str {
    if commit_id.len() >= 7 {
        &commit_id[..7]
    } else {
        commit_id
    }
}

/// Formats an epoch timestamp as a local wall-clock date.
#[must_use]
pub fn format_timestamp(timestamp: f64) -> String {
    use chrono::{Local, TimeZone};

    #[allow(clippy::cast_possible_truncation)]
    let secs = timestamp as i64;
    Local.timestamp_opt(secs, 0).single().map_or_else(
        || format!("invalid timestamp: {timestamp}"),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Formats an epoch timestamp as a humanized relative time ("3 hours ago").
#[must_use]
pub fn format_relative_time(timestamp: f64) -> String {
    use chrono::Utc;

    #[allow(clippy::cast_possible_truncation)]
    let diff = Utc::now().timestamp() - timestamp as i64;

    if diff < 0 {
        return "in the future".to_string();
    }

    let (value, unit) = if diff < 60 {
        (diff, "second")
    } else if diff < 3600 {
        (diff / 60, "minute")
    } else if diff < 86400 {
        (diff / 3600, "hour")
    } else if diff < 2_592_000 {
        (diff / 86400, "day")
    } else if diff < 31_536_000 {
        (diff / 2_592_000, "month")
    } else {
        (diff / 31_536_000, "year")
    };

    if value == 1 {
        format!("{value} {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

/// Returns the first line of a commit message.
#[must_use]
pub fn subject_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}
