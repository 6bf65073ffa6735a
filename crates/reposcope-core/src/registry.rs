//! A process-wide catalog of collector instances.

use indexmap::IndexMap;

use crate::collector::Collector;

/// Owns the set of collectors a [`crate::pipeline::Pipeline`] will drive.
///
/// A plain ordered map from name to boxed trait object, built once at
/// startup by whatever binds the collector crates together.
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: IndexMap<&'static str, Box<dyn Collector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, collector: Box<dyn Collector>) {
        self.collectors.insert(name, collector);
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &dyn Collector)> {
        self.collectors.iter().map(|(name, c)| (*name, c.as_ref()))
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.collectors.len())
            .finish()
    }
}
