//! Dead-symbol detection: per-language definition extraction, reference
//! search across non-test and test sources, and visibility-aware confidence
//! classification.

pub mod collector;
pub mod references;
pub mod symbols;

pub use collector::DeadCodeCollector;
