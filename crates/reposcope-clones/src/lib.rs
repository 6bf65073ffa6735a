//! Duplicate-code detection via Type-1/Type-2 normalization and
//! sliding-window content hashing.

pub mod collector;
pub mod fnv;
pub mod grouping;
pub mod normalize;
pub mod unionfind;
pub mod window;

pub use collector::CloneCollector;
