//! A shared source-file walker built on `ignore`/`globset`.
//!
//! Every collector that scans source files (coupling, dead-code,
//! config-drift) builds its file list through this module so that
//! `IncludePatterns`/`ExcludePatterns` handling and vendor/`node_modules`
//! suppression is written once.

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::opts::CollectorOpts;

/// Directories that are never walked regardless of `opts`.
const ALWAYS_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "vendor",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
];

/// A compiled include/exclude glob pair.
pub struct PatternMatcher {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PatternMatcher {
    pub fn new(opts: &CollectorOpts) -> anyhow::Result<Self> {
        let include = if opts.include_patterns.is_empty() {
            None
        } else {
            Some(build_globset(&opts.include_patterns)?)
        };
        let exclude = build_globset(&opts.exclude_patterns)?;
        Ok(Self { include, exclude })
    }

    /// Whether `path` (repo-relative, forward-slash) should be scanned.
    pub fn matches(&self, path: &str) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(path),
            None => true,
        }
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Walks `repo_root`, returning repo-relative, forward-slash paths to
/// regular files that pass both the default vendor/build-artifact
/// suppression and the caller-supplied [`PatternMatcher`].
pub fn walk_files(repo_root: &Utf8Path, matcher: &PatternMatcher) -> Vec<Utf8PathBuf> {
    let mut walker = WalkBuilder::new(repo_root.as_std_path());
    walker.hidden(false).git_ignore(true).git_exclude(true);
    walker.filter_entry(|entry| {
        !entry
            .path()
            .components()
            .any(|c| match c.as_os_str().to_str() {
                Some(name) => ALWAYS_EXCLUDED_DIRS.contains(&name),
                None => false,
            })
    });

    let mut out = Vec::new();
    for entry in walker.build().flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) else {
            continue;
        };
        let Ok(relative) = path.strip_prefix(repo_root) else {
            continue;
        };
        let relative = relative.as_str().replace('\\', "/");
        if matcher.matches(&relative) {
            out.push(Utf8PathBuf::from(relative));
        }
    }
    out.sort();
    out
}

/// Whether `relative_path` looks like a demo/example/sample path, used to
/// suppress lottery-risk signals under demo directories by default.
pub fn is_demo_path(relative_path: &str) -> bool {
    const MARKERS: &[&str] = &["examples/", "example/", "demo/", "samples/"];
    let normalized = format!("{}/", relative_path.trim_end_matches('/'));
    MARKERS.iter().any(|m| normalized.contains(m))
}

/// Known non-source-code extensions to skip entirely when building a
/// source inventory (test-only and build-output files are handled by
/// individual collectors, not here).
pub fn has_source_extension(path: &Utf8Path) -> bool {
    matches!(
        path.extension(),
        Some(
            "go" | "js"
                | "jsx"
                | "ts"
                | "tsx"
                | "py"
                | "java"
                | "rs"
                | "rb"
                | "c"
                | "h"
                | "cpp"
                | "hpp"
                | "php"
                | "scala"
                | "swift"
                | "ex"
                | "cs"
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_path_suppression() {
        assert!(is_demo_path("examples/foo/bar.go"));
        assert!(is_demo_path("pkg/demo/baz.go"));
        assert!(!is_demo_path("pkg/foo/bar.go"));
    }

    #[test]
    fn pattern_matcher_include_then_exclude() {
        let opts = CollectorOpts {
            include_patterns: vec!["**/*.go".to_string()],
            exclude_patterns: vec!["**/vendor/**".to_string()],
            ..Default::default()
        };
        let matcher = PatternMatcher::new(&opts).unwrap();
        assert!(matcher.matches("pkg/a.go"));
        assert!(!matcher.matches("pkg/vendor/a.go"));
        assert!(!matcher.matches("pkg/a.rb"));
    }
}
