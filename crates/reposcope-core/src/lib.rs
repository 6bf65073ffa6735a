//! Collector contract, registry, pipeline, and the shared utilities every
//! collector crate in this workspace builds on: signal construction, file
//! walking, duration parsing, author anonymization, and a shared GitHub
//! HTTP client.

pub mod anonymize;
pub mod collector;
pub mod context;
pub mod duration;
pub mod github;
pub mod gitutil;
pub mod http;
pub mod opts;
pub mod pipeline;
pub mod registry;
pub mod signal;
pub mod walk;

pub use collector::{Collector, CollectorCore, CollectorError, CollectorLoadError, CollectOutput, finalize_signals};
pub use context::{RunContext, SharedMetrics};
pub use opts::{Anonymize, CollectorOpts};
pub use pipeline::{CollectorOutcome, Pipeline, PipelineError, PipelineReport};
pub use registry::CollectorRegistry;
pub use signal::{RawSignal, SignalBuilder};
