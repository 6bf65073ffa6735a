//! Issue and pull-request classification.

use std::sync::LazyLock;

use regex::Regex;

/// An issue considered "very old" without a label boost is reclassified
/// `github-stale-issue` rather than left as a plain `github-issue`. The
/// threshold isn't pinned anywhere else; chosen here alongside the other
/// open-question decisions recorded in `DESIGN.md`.
pub const VERY_OLD_DAYS: f64 = 180.0;

const AGE_BOOST_THRESHOLD_DAYS: f64 = 90.0;
const AGE_BOOST: f64 = 0.1;

static ACTIONABLE_REVIEW_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(TODO|FIXME|should|needs|must)\b").unwrap());

/// Whether a review comment's body reads as actionable — the
/// `github-review-todo` pattern.
pub fn is_actionable_review_comment(body: &str) -> bool {
    ACTIONABLE_REVIEW_COMMENT.is_match(body)
}

fn age_boost(age_days: f64) -> f64 {
    if age_days >= AGE_BOOST_THRESHOLD_DAYS { AGE_BOOST } else { 0.0 }
}

/// The `(kind, confidence)` classification for an open issue, given its
/// labels and age in days.
pub fn classify_open_issue(labels: &[String], age_days: f64) -> (&'static str, f64) {
    let has_bug = labels.iter().any(|l| l.eq_ignore_ascii_case("bug"));
    let has_feature = labels.iter().any(|l| l.eq_ignore_ascii_case("enhancement") || l.eq_ignore_ascii_case("feature"));

    if has_bug {
        ("github-bug", (0.7 + age_boost(age_days)).min(1.0))
    } else if has_feature {
        ("github-feature", (0.5 + age_boost(age_days)).min(1.0))
    } else if age_days >= VERY_OLD_DAYS {
        ("github-stale-issue", 0.2)
    } else {
        ("github-issue", (0.4 + age_boost(age_days)).min(1.0))
    }
}

/// A closed issue is always classified `github-closed-issue` at a fixed
/// confidence, tagged `pre-closed` so downstream consumers can filter it.
pub const CLOSED_ISSUE_KIND: &str = "github-closed-issue";
pub const CLOSED_ISSUE_CONFIDENCE: f64 = 0.3;

/// A pull request's review state: whether any review requested changes or
/// approved, independent of ordering.
#[derive(Copy, Clone, Debug, Default)]
pub struct ReviewState {
    pub any_changes_requested: bool,
    pub any_approved: bool,
}

/// The `(kind, confidence)` classification for an open pull request's
/// review state.
pub fn classify_open_pr(review_state: ReviewState) -> (&'static str, f64) {
    if review_state.any_changes_requested {
        ("github-pr-changes", 0.7)
    } else if review_state.any_approved {
        ("github-pr-approved", 0.6)
    } else {
        ("github-pr-pending", 0.5)
    }
}

/// Confidence for a `github-review-todo` signal: a 0.6 base plus the same
/// age boost used for issues.
pub fn review_todo_confidence(age_days: f64) -> f64 {
    (0.6 + age_boost(age_days)).min(1.0)
}

/// The `(kind, confidence)` classification for a closed pull request.
pub fn classify_closed_pr(merged: bool) -> (&'static str, f64) {
    if merged { ("github-merged-pr", 0.3) } else { ("github-closed-pr", 0.2) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bug_label_wins_over_feature() {
        let labels = vec!["bug".to_string(), "enhancement".to_string()];
        assert_eq!(classify_open_issue(&labels, 10.0), ("github-bug", 0.7));
    }

    #[test]
    fn age_boost_applies_and_saturates() {
        let labels = vec!["bug".to_string()];
        assert_eq!(classify_open_issue(&labels, 100.0), ("github-bug", 0.8));
        assert_eq!(classify_open_issue(&labels, 10.0), ("github-bug", 0.7));
    }

    #[test]
    fn unlabeled_very_old_issue_is_stale() {
        assert_eq!(classify_open_issue(&[], 200.0), ("github-stale-issue", 0.2));
        assert_eq!(classify_open_issue(&[], 50.0), ("github-issue", 0.4));
    }

    #[test]
    fn pr_review_state_precedence() {
        assert_eq!(
            classify_open_pr(ReviewState {
                any_changes_requested: true,
                any_approved: true
            }),
            ("github-pr-changes", 0.7)
        );
        assert_eq!(
            classify_open_pr(ReviewState {
                any_changes_requested: false,
                any_approved: true
            }),
            ("github-pr-approved", 0.6)
        );
        assert_eq!(classify_open_pr(ReviewState::default()), ("github-pr-pending", 0.5));
    }

    #[test]
    fn actionable_comment_patterns() {
        assert!(is_actionable_review_comment("This should be refactored"));
        assert!(is_actionable_review_comment("TODO: fix this"));
        assert!(!is_actionable_review_comment("Looks good to me"));
    }

    #[test]
    fn closed_pr_merged_vs_unmerged() {
        assert_eq!(classify_closed_pr(true), ("github-merged-pr", 0.3));
        assert_eq!(classify_closed_pr(false), ("github-closed-pr", 0.2));
    }
}
