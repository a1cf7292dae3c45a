//! Scripted configuration sources

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use stratum_core::source::DEFAULT_ORDINAL;
use stratum_core::{ConfigSource, Result};

/// A mutable in-memory source for tests.
///
/// Entries can be changed while a configuration holds the source, which
/// makes it easy to verify that lookups re-read their sources instead of
/// caching. The number of close calls is tracked.
pub struct MapSource {
    name: String,
    ordinal: i32,
    entries: RwLock<BTreeMap<String, String>>,
    closes: AtomicUsize,
}

impl MapSource {
    /// Create an empty source with the default ordinal.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_ordinal(name, DEFAULT_ORDINAL)
    }

    /// Create an empty source with an explicit ordinal.
    pub fn with_ordinal(name: impl Into<String>, ordinal: i32) -> Self {
        Self {
            name: name.into(),
            ordinal,
            entries: RwLock::new(BTreeMap::new()),
            closes: AtomicUsize::new(0),
        }
    }

    /// Builder-style entry insertion.
    pub fn with_entry(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace an entry.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(name.into(), value.into());
    }

    /// Remove an entry.
    pub fn remove(&self, name: &str) {
        self.entries.write().remove(name);
    }

    /// How many times [`ConfigSource::close`] ran on this source.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// This source as a shared trait object.
    pub fn shared(self) -> Arc<dyn ConfigSource> {
        Arc::new(self)
    }
}

impl ConfigSource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn property_names(&self) -> BTreeSet<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        self.entries.read().get(name).cloned()
    }

    fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
