//! Revert-commit detection via subject-line and body patterns.

use std::sync::LazyLock;

use regex::Regex;

static SUBJECT_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)^revert\s+"(.+)""#).unwrap());
static SUBJECT_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^revert:\s*(.+)").unwrap());
static BODY_REVERTS_COMMIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)this reverts commit\s+([0-9a-f]{7,40})").unwrap());

/// Whether `message` (a full commit message: subject + body) looks like a
/// revert.
pub fn is_revert(message: &str) -> bool {
    let subject = message.lines().next().unwrap_or("");
    SUBJECT_QUOTED.is_match(subject) || SUBJECT_COLON.is_match(subject) || BODY_REVERTS_COMMIT.is_match(message)
}

/// The original commit's one-line description, if recoverable from the
/// subject, for use in the signal title.
pub fn reverted_subject(message: &str) -> Option<String> {
    let subject = message.lines().next().unwrap_or("");
    if let Some(caps) = SUBJECT_QUOTED.captures(subject) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = SUBJECT_COLON.captures(subject) {
        return Some(caps[1].trim().to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_quoted_revert_subject() {
        assert!(is_revert("Revert \"add flaky retry logic\"\n"));
        assert_eq!(reverted_subject("Revert \"add flaky retry logic\"\n").as_deref(), Some("add flaky retry logic"));
    }

    #[test]
    fn detects_colon_revert_subject() {
        assert!(is_revert("revert: remove debug logging\n"));
    }

    #[test]
    fn detects_body_revert_reference() {
        let message = "Undo recent change\n\nThis reverts commit abcdef1234567890.\n";
        assert!(is_revert(message));
    }

    #[test]
    fn ordinary_commit_is_not_a_revert() {
        assert!(!is_revert("Add new feature flag\n"));
    }
}
