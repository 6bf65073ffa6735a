//! Duration-string parsing for `GitSince`, `HistoryDepth`, and
//! `StalenessThreshold`.

use std::time::Duration;

/// Parses a duration string such as `"30d"`, `"2 weeks"`, or `"90d"`.
///
/// Delegates to `humantime`, which natively understands `s`/`m`/`h`/`d`/`w`
/// units; the single addition here is accepting a bare `Nd` shorthand
/// (`humantime` wants `"30days"` or `"30d"` — both already work — so this
/// is mostly a documented pass-through with a friendlier error message).
pub fn parse_duration(input: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(input.trim())
        .map_err(|e| anyhow::anyhow!("invalid duration {input:?}: {e}"))
}

/// Days between `timestamp` and `now`, clamped to `0` for future timestamps
/// (commits in the future or today get a recency weight of 1).
pub fn days_old(timestamp: chrono::DateTime<chrono::Utc>, now: chrono::DateTime<chrono::Utc>) -> f64 {
    let delta = now.signed_duration_since(timestamp);
    delta.num_seconds().max(0) as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_duration("30d").unwrap(), Duration::from_secs(30 * 86_400));
        assert_eq!(parse_duration("90d").unwrap(), Duration::from_secs(90 * 86_400));
        assert_eq!(parse_duration("2w").unwrap(), Duration::from_secs(14 * 86_400));
    }

    #[test]
    fn rejects_nonsense() {
        assert!(parse_duration("not a duration").is_err());
    }

    #[test]
    fn days_old_floors_future_at_zero() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let future = chrono::Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(days_old(future, now), 0.0);

        let past = chrono::Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        assert!((days_old(past, now) - 31.0).abs() < 0.01);
    }
}
