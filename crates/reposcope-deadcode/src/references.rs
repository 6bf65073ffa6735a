//! Test-file classification and textual reference search.

use regex::Regex;

/// Whether `relative_path` looks like a test file, by filename convention.
pub fn is_test_file(relative_path: &str) -> bool {
    let lower = relative_path.to_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);

    file_name.ends_with("_test.go")
        || file_name.ends_with(".test.js")
        || file_name.ends_with(".test.ts")
        || file_name.ends_with(".test.jsx")
        || file_name.ends_with(".test.tsx")
        || file_name.ends_with(".spec.js")
        || file_name.ends_with(".spec.ts")
        || file_name.starts_with("test_")
        || file_name.ends_with("_test.py")
        || file_name.ends_with("test.java")
        || file_name.ends_with("_test.rb")
        || file_name.ends_with("_spec.rb")
        || lower.contains("/tests/")
        || lower.contains("/test/")
        || lower.contains("/__tests__/")
}

/// Builds a word-boundary regex matching the literal symbol name.
fn name_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(name))).expect("symbol name is a valid identifier")
}

/// Cache-free occurrence check: does `contents` reference `name` anywhere?
pub fn references_symbol(name: &str, contents: &str) -> bool {
    name_pattern(name).is_match(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_detection() {
        assert!(is_test_file("pkg/foo_test.go"));
        assert!(is_test_file("src/components/Button.test.tsx"));
        assert!(is_test_file("tests/test_helpers.py"));
        assert!(!is_test_file("pkg/foo.go"));
    }

    #[test]
    fn reference_search_is_word_bounded() {
        assert!(references_symbol("usedFunc", "result := usedFunc()"));
        assert!(!references_symbol("used", "result := usedFunc()"));
    }
}
