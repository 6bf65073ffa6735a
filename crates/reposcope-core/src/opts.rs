//! [`CollectorOpts`]: the configuration record passed to every collector.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;

/// Author-anonymization policy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Anonymize {
    Always,
    Never,
    /// Anonymize only when the GitHub repo is known to be public.
    Auto,
    #[default]
    Unset,
}

impl Anonymize {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "always" => Self::Always,
            "never" => Self::Never,
            "auto" => Self::Auto,
            _ => Self::Unset,
        }
    }
}

/// A callback invoked by collectors to report coarse-grained progress.
///
/// Must be invoked on the same thread/task that holds the work; callers
/// may not assume cross-thread safety of the callback's *internal* state,
/// only that the `Fn` itself is `Send + Sync` so it can be handed to an
/// async collector.
pub type ProgressFunc = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration passed to every [`crate::collector::Collector`].
#[derive(Clone)]
pub struct CollectorOpts {
    /// Signals below this confidence are filtered at emission time.
    pub min_confidence: f64,
    /// Glob patterns (with `**` semantics) that restrict scanning to
    /// matching paths. Empty means "no restriction".
    pub include_patterns: Vec<String>,
    /// Glob patterns that exclude matching paths, evaluated after
    /// `include_patterns`.
    pub exclude_patterns: Vec<String>,
    /// Alternate directory for git operations, when scanning a subtree of a
    /// larger repository.
    pub git_root: Option<Utf8PathBuf>,
    /// Bound on how far back a commit walk may look.
    pub git_since: Option<Duration>,
    /// Bound on how many commits a commit walk may visit.
    pub git_depth: Option<usize>,
    /// Whether to include closed issues/merged PRs in GitHub collectors.
    pub include_closed: bool,
    /// How far back closed issues/PRs are still considered, relative to now.
    pub history_depth: Option<Duration>,
    /// Cutoff for dependency push-activity staleness checks.
    pub staleness_threshold: Option<Duration>,
    /// Cap on the number of issues/PRs a GitHub collector will return.
    pub max_issues: usize,
    /// Author-anonymization policy.
    pub anonymize: Anonymize,
    /// If false, paths under `examples/`, `example/`, `demo/`, `samples/`
    /// are suppressed from lottery-risk output.
    pub include_demo_paths: bool,
    /// Optional progress callback.
    pub progress: Option<ProgressFunc>,
    /// Upper bound on concurrently-running collectors. Defaults to the
    /// number of available CPUs.
    pub max_parallel_collectors: usize,
    /// Escape hatch for collector-specific knobs the host doesn't need to
    /// understand.
    pub extra: HashMap<String, String>,
}

impl CollectorOpts {
    /// Report progress, if a callback was configured.
    pub fn report(&self, message: &str) {
        if let Some(progress) = &self.progress {
            progress(message);
        }
    }
}

impl Default for CollectorOpts {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            git_root: None,
            git_since: None,
            git_depth: None,
            include_closed: false,
            history_depth: None,
            staleness_threshold: None,
            max_issues: 100,
            anonymize: Anonymize::Unset,
            include_demo_paths: false,
            progress: None,
            max_parallel_collectors: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            extra: HashMap::new(),
        }
    }
}
