//! Drift between declared env-template keys and the keys code actually
//! references, plus inconsistent defaults across template files.

pub mod collector;
pub mod placeholder;
pub mod references;
pub mod templates;

pub use collector::ConfDriftCollector;
