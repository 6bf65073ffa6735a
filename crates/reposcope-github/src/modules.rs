//! The "Modules affected: …" summary attached to merged/closed PR signals.

use indexmap::IndexSet;

/// The top two path segments of `path` (its containing module, roughly).
pub fn top_two_segments(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    if segments.is_empty() {
        return path.to_string();
    }
    segments.truncate(2);
    segments.join("/")
}

/// Builds the `"Modules affected: a, b, c"` summary from a pull request's
/// changed-file paths: top-two-segment grouping, deduplicated and sorted.
pub fn modules_affected_summary(file_paths: &[String]) -> String {
    let mut modules: IndexSet<String> = file_paths.iter().map(|p| top_two_segments(p)).collect();
    let mut sorted: Vec<String> = modules.drain(..).collect();
    sorted.sort();
    format!("Modules affected: {}", sorted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_top_two_segments() {
        assert_eq!(top_two_segments("src/foo/bar.rs"), "src/foo");
        assert_eq!(top_two_segments("src/foo.rs"), "src");
        assert_eq!(top_two_segments("README.md"), "README.md");
        assert_eq!(top_two_segments("crates/reposcope-core/src/lib.rs"), "crates/reposcope-core");
    }

    #[test]
    fn summary_dedupes_and_sorts() {
        let files = vec![
            "crates/b/src/a.rs".to_string(),
            "crates/a/src/b.rs".to_string(),
            "crates/b/src/c.rs".to_string(),
        ];
        assert_eq!(modules_affected_summary(&files), "Modules affected: crates/a, crates/b");
    }
}
