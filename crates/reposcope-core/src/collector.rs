//! The [`Collector`] contract.
//!
//! Metadata that doesn't need a live instance lives on [`CollectorCore`],
//! the actual analysis lives on [`Collector`].

use camino::Utf8Path;
use thiserror::Error;

use crate::context::{MetricsDoc, RunContext};
use crate::opts::CollectorOpts;
use crate::signal::RawSignal;

/// Sizeless metadata every collector must expose.
pub trait CollectorCore {
    /// A unique, stable identifier (e.g. `"coupling"`, `"dead-code"`).
    fn name() -> &'static str
    where
        Self: Sized;
}

/// A collector failed to construct.
#[derive(Debug, Error)]
pub enum CollectorLoadError {
    /// The collector's prerequisites are absent in a way that suggests it
    /// should be skipped, not that the whole run should fail (no `go.mod`,
    /// no GitHub token, not a git repository, ...).
    #[error("{0}")]
    Skip(anyhow::Error),
    /// Construction failed in a way that should abort the run.
    #[error("{0}")]
    Fail(anyhow::Error),
}

/// Errors a collector's `collect` call may return.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The run was cancelled while this collector was in progress.
    #[error("collection cancelled")]
    Cancelled,
    /// A present-but-unparseable input (manifest, git object, ...).
    #[error("failed to parse input: {0}")]
    Malformed(#[source] anyhow::Error),
    /// A filesystem read failed on a file the collector intended to read.
    #[error("filesystem error: {0}")]
    Io(#[source] std::io::Error),
    /// Any other unexpected failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The result of a single `Collector::collect` call.
#[derive(Default)]
pub struct CollectOutput {
    pub signals: Vec<RawSignal>,
    pub metrics: Option<MetricsDoc>,
}

impl CollectOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(signals: Vec<RawSignal>) -> Self {
        Self {
            signals,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsDoc) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// A self-contained analyzer producing [`RawSignal`]s for one concern.
///
/// Implementors **must** honor cancellation (check `ctx.cancelled()` before
/// any blocking I/O and on every outer-loop iteration), and **must** return
/// `Ok(CollectOutput::empty())` rather than an error when a required input
/// is simply absent (no manifest, no token, not a git repo). Malformed
/// input that *is* present is still an error.
#[async_trait::async_trait]
pub trait Collector: CollectorCore + Send + Sync {
    async fn collect(
        &self,
        ctx: &RunContext,
        repo_path: &Utf8Path,
        opts: &CollectorOpts,
    ) -> Result<CollectOutput, CollectorError>;
}

/// Applies `opts.min_confidence` and sorts signals by `file_path`, matching
/// the contract's "signals are sorted by file_path before return" rule.
pub fn finalize_signals(mut signals: Vec<RawSignal>, opts: &CollectorOpts) -> Vec<RawSignal> {
    signals.retain(|s| s.confidence >= opts.min_confidence);
    signals.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.line.cmp(&b.line)));
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::RawSignal;

    fn signal(path: &str, line: u32, confidence: f64) -> RawSignal {
        RawSignal::builder("test", "kind")
            .file_path(path)
            .line(line)
            .title("t")
            .confidence(confidence)
            .build()
            .unwrap()
    }

    #[test]
    fn finalize_filters_and_sorts() {
        let opts = CollectorOpts {
            min_confidence: 0.5,
            ..Default::default()
        };
        let signals = vec![
            signal("b.rs", 10, 0.9),
            signal("a.rs", 5, 0.2),
            signal("a.rs", 1, 0.8),
        ];
        let out = finalize_signals(signals, &opts);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].file_path, "a.rs");
        assert_eq!(out[0].line, 1);
        assert_eq!(out[1].file_path, "b.rs");
    }
}
