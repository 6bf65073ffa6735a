//! Per-run state shared (read-only) across all collectors.

use std::sync::Mutex;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

/// A language-neutral metrics document for a single collector's last run.
pub type MetricsDoc = serde_json::Value;

/// Shared metrics map, keyed by collector name.
///
/// This is the one documented channel through which collectors may be
/// observed by the host after the fact; collectors never read each other's
/// entries, they only write their own.
#[derive(Default)]
pub struct SharedMetrics(Mutex<IndexMap<String, MetricsDoc>>);

impl SharedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, collector: impl Into<String>, doc: MetricsDoc) {
        self.0.lock().unwrap().insert(collector.into(), doc);
    }

    pub fn snapshot(&self) -> IndexMap<String, MetricsDoc> {
        self.0.lock().unwrap().clone()
    }
}

/// State threaded through every `Collector::collect` call.
///
/// Carries the run's cancellation token (checked at every suspension point:
/// directory walks, commit walks, paginated API loops, outbound HTTP calls)
/// and the shared metrics map. `RunContext` is cheap to
/// clone — cloning shares the underlying token and metrics map rather than
/// duplicating them.
#[derive(Clone)]
pub struct RunContext {
    cancellation: CancellationToken,
    metrics: std::sync::Arc<SharedMetrics>,
}

impl RunContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            metrics: std::sync::Arc::new(SharedMetrics::new()),
        }
    }

    /// Whether the run has been cancelled. Collectors must check this at
    /// every suspension point before blocking I/O.
    pub fn cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the run is cancelled; useful in `tokio::select!` loops
    /// racing against an in-flight I/O future.
    pub async fn cancelled_fut(&self) {
        self.cancellation.cancelled().await
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
