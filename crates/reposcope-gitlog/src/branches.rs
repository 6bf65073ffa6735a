//! Stale-branch detection.

const PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop", "HEAD"];
const STALE_THRESHOLD_DAYS: f64 = 30.0;
const STALE_SATURATION_DAYS: f64 = 90.0;

/// Whether `short_name` (a branch's short reference name) should be
/// considered for staleness, i.e. not one of the protected defaults.
pub fn is_candidate_branch(short_name: &str) -> bool {
    !PROTECTED_BRANCHES.contains(&short_name)
}

/// Confidence for a branch whose tip is `days_old` days old: 0 below 30
/// days, linearly interpolated from 0.3 at 30 days to 0.6 at 90+ days.
pub fn stale_confidence(days_old: f64) -> f64 {
    if days_old < STALE_THRESHOLD_DAYS {
        return 0.0;
    }
    let span = STALE_SATURATION_DAYS - STALE_THRESHOLD_DAYS;
    let progress = (days_old - STALE_THRESHOLD_DAYS) / span;
    (0.3 + progress * 0.3).min(0.6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_branches_are_excluded() {
        assert!(!is_candidate_branch("main"));
        assert!(!is_candidate_branch("master"));
        assert!(is_candidate_branch("feature/foo"));
    }

    #[test]
    fn fresh_branch_has_zero_confidence() {
        assert_eq!(stale_confidence(10.0), 0.0);
    }

    #[test]
    fn confidence_interpolates_and_saturates() {
        assert_eq!(stale_confidence(30.0), 0.3);
        assert_eq!(stale_confidence(90.0), 0.6);
        assert_eq!(stale_confidence(365.0), 0.6);
    }
}
