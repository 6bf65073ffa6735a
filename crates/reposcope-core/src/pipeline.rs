//! Drives every registered collector and aggregates their signals.

use camino::Utf8Path;
use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::instrument;

use crate::collector::{CollectorError, finalize_signals};
use crate::context::RunContext;
use crate::opts::CollectorOpts;
use crate::registry::CollectorRegistry;
use crate::signal::RawSignal;

/// Errors from running the pipeline itself (not from an individual
/// collector, which are reported per-collector in [`PipelineReport`]).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("the run was cancelled before any collector completed")]
    CancelledEarly,
}

/// One collector's outcome within a run.
pub struct CollectorOutcome {
    pub name: &'static str,
    pub result: Result<(), CollectorError>,
}

/// The aggregated result of a pipeline run.
#[derive(Default)]
pub struct PipelineReport {
    pub signals: Vec<RawSignal>,
    pub outcomes: Vec<CollectorOutcome>,
}

impl PipelineReport {
    /// Collector names that failed (cancellation counts as a failure here;
    /// input-absent is not an error and is not surfaced in `outcomes`).
    pub fn failed(&self) -> impl Iterator<Item = (&'static str, &CollectorError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name, e)))
    }
}

/// Runs each registered collector, at most `opts.max_parallel_collectors`
/// at a time, and aggregates their signals.
///
/// Cancellation is cooperative: a pre-cancelled `ctx` causes every
/// collector invocation to observe cancellation at its very first
/// suspension point and return `CollectorError::Cancelled`; the pipeline
/// discards those collectors' partial results (there are none to discard,
/// by the collector contract) and reports the failure via `outcomes`.
pub struct Pipeline<'a> {
    registry: &'a CollectorRegistry,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a CollectorRegistry) -> Self {
        Self { registry }
    }

    #[instrument(skip(self, ctx, opts))]
    pub async fn run(
        &self,
        ctx: &RunContext,
        repo_path: &Utf8Path,
        opts: &CollectorOpts,
    ) -> Result<PipelineReport, PipelineError> {
        if ctx.cancelled() {
            return Err(PipelineError::CancelledEarly);
        }

        let permits = opts.max_parallel_collectors.max(1);
        let semaphore = std::sync::Arc::new(Semaphore::new(permits));

        let mut tasks = FuturesUnordered::new();
        for (name, collector) in self.registry.iter() {
            let semaphore = semaphore.clone();
            tasks.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                opts.report(&format!("running collector {name}"));
                let result = collector.collect(ctx, repo_path, opts).await;
                (name, result)
            });
        }

        let mut report = PipelineReport::default();
        while let Some((name, result)) = tasks.next().await {
            match result {
                Ok(output) => {
                    if let Some(metrics) = output.metrics {
                        ctx.metrics().record(name, metrics);
                    }
                    report
                        .signals
                        .extend(finalize_signals(output.signals, opts));
                    report.outcomes.push(CollectorOutcome { name, result: Ok(()) });
                }
                Err(err) => {
                    tracing::debug!(collector = name, error = %err, "collector failed");
                    report.outcomes.push(CollectorOutcome {
                        name,
                        result: Err(err),
                    });
                }
            }
        }

        report.signals.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then(a.line.cmp(&b.line))
                .then(a.source.cmp(&b.source))
        });

        Ok(report)
    }
}
