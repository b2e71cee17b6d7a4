//! Utility functions and helpers.
//!
//! # Submodules
//!
//! - [`ident`]: commit id generation and branch-name validation
//! - [`formatters`]: display formatting for ids and timestamps

/// Output formatting for ids and timestamps
pub mod formatters;
/// Commit id generation and branch-name validation
pub mod ident;

/// Returns the current time as fractional seconds since the Unix epoch.
///
/// Subsecond precision is what keeps rapid successive commits ordered and
/// their ids distinct.
#[must_use]
pub fn precise_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precise_timestamp_is_recent() {
        let ts = precise_timestamp();
        // Some time after 2020 and with a fractional part available
        assert!(ts > 1_577_836_800.0);
    }

    #[test]
    fn test_precise_timestamp_monotonic_enough() {
        let a = precise_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = precise_timestamp();
        assert!(b > a);
    }
}
