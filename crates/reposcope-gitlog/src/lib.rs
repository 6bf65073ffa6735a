//! Single-pass commit-walk analysis: revert detection, file churn, and
//! stale-branch detection.

pub mod branches;
pub mod churn;
pub mod collector;
pub mod reverts;

pub use collector::GitLogCollector;
