//! File-churn counting within a 90-day window.

pub const CHURN_WINDOW_DAYS: i64 = 90;
pub const CHURN_THRESHOLD: u32 = 10;

/// Confidence for a file with `modifications` changes within the churn
/// window: 0 below the threshold, linearly interpolated from 0.4 at the
/// threshold to 0.8 at 30+ modifications.
pub fn churn_confidence(modifications: u32) -> f64 {
    if modifications < CHURN_THRESHOLD {
        return 0.0;
    }
    let extra = (modifications - CHURN_THRESHOLD) as f64;
    (0.4 + extra / 20.0 * 0.4).min(0.8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_zero() {
        assert_eq!(churn_confidence(9), 0.0);
    }

    #[test]
    fn interpolates_between_bounds() {
        assert_eq!(churn_confidence(10), 0.4);
        assert_eq!(churn_confidence(30), 0.8);
        assert_eq!(churn_confidence(100), 0.8);
        assert!((churn_confidence(20) - 0.6).abs() < 1e-9);
    }
}
