//! Import-cycle (strongly-connected-component) and coupling-hub (fan-out)
//! detection across languages.

pub mod collector;
pub mod graph;
pub mod identity;
pub mod imports;

pub use collector::CouplingCollector;
