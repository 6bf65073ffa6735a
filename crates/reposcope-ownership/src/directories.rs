//! Directory discovery: every directory containing a source file, plus the
//! repo root itself.

use std::collections::BTreeSet;

use camino::Utf8Path;
use reposcope_core::walk::{PatternMatcher, has_source_extension, walk_files};

/// Discovers every repo-relative directory that contains at least one
/// source file, always including `.` (the repo root).
pub fn discover_directories(repo_path: &Utf8Path, matcher: &PatternMatcher) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    dirs.insert(".".to_string());

    for file in walk_files(repo_path, matcher) {
        if !has_source_extension(Utf8Path::new(file.as_str())) {
            continue;
        }
        let dir = match file.parent() {
            Some(p) if !p.as_str().is_empty() => p.as_str().to_string(),
            _ => ".".to_string(),
        };
        dirs.insert(dir);
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposcope_core::CollectorOpts;

    #[test]
    fn finds_directories_with_source_and_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("pkg/sub")).unwrap();
        std::fs::write(root.join("pkg/sub/a.go"), "package sub").unwrap();
        std::fs::write(root.join("README.md"), "hi").unwrap();

        let matcher = PatternMatcher::new(&CollectorOpts::default()).unwrap();
        let dirs = discover_directories(&root, &matcher);
        assert!(dirs.contains("."));
        assert!(dirs.contains("pkg/sub"));
        assert!(!dirs.contains("pkg")); // no source file directly under pkg/
    }
}
