//! Process property table and source
//!
//! The Rust rendering of system properties: a process-wide mutable
//! string table that the host can populate at startup (or tests can poke)
//! and that outranks the environment during lookup.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::source::ConfigSource;

/// Ordinal of the process property source.
pub const PROCESS_PROPERTIES_ORDINAL: i32 = 400;

static TABLE: Lazy<RwLock<HashMap<String, String>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// The process-wide property table.
///
/// All accessors take a write or read lock on the shared table; entries
/// survive for the lifetime of the process unless removed.
pub struct ProcessProperties;

impl ProcessProperties {
    /// Set a property, returning the previous value if any.
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        TABLE.write().insert(name.into(), value.into())
    }

    /// Get a property value.
    pub fn get(name: &str) -> Option<String> {
        TABLE.read().get(name).cloned()
    }

    /// Remove a property, returning its value if it was set.
    pub fn remove(name: &str) -> Option<String> {
        TABLE.write().remove(name)
    }

    /// Remove every property.
    pub fn clear() {
        TABLE.write().clear();
    }

    /// Snapshot of the whole table.
    pub fn snapshot() -> BTreeMap<String, String> {
        TABLE
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Configuration source backed by [`ProcessProperties`].
#[derive(Debug, Default)]
pub struct ProcessPropertySource;

impl ProcessPropertySource {
    /// Create a new process property source.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigSource for ProcessPropertySource {
    fn name(&self) -> &str {
        "process properties"
    }

    fn ordinal(&self) -> i32 {
        PROCESS_PROPERTIES_ORDINAL
    }

    fn property_names(&self) -> BTreeSet<String> {
        TABLE.read().keys().cloned().collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        ProcessProperties::get(name)
    }

    fn properties(&self) -> BTreeMap<String, String> {
        ProcessProperties::snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_round_trip() {
        assert_eq!(ProcessProperties::set("stratum.test.roundtrip", "1"), None);
        assert_eq!(
            ProcessProperties::set("stratum.test.roundtrip", "2").as_deref(),
            Some("1")
        );
        assert_eq!(
            ProcessProperties::get("stratum.test.roundtrip").as_deref(),
            Some("2")
        );
        assert_eq!(
            ProcessProperties::remove("stratum.test.roundtrip").as_deref(),
            Some("2")
        );
        assert_eq!(ProcessProperties::get("stratum.test.roundtrip"), None);
    }

    #[test]
    fn test_source_reads_the_table() {
        ProcessProperties::set("stratum.test.source", "table value");
        let source = ProcessPropertySource::new();
        assert_eq!(source.ordinal(), PROCESS_PROPERTIES_ORDINAL);
        assert_eq!(
            source.value("stratum.test.source").as_deref(),
            Some("table value")
        );
        assert!(source.property_names().contains("stratum.test.source"));
        assert!(source.properties().contains_key("stratum.test.source"));
        ProcessProperties::remove("stratum.test.source");
    }

    #[test]
    fn test_source_reflects_later_mutation() {
        let source = ProcessPropertySource::new();
        assert_eq!(source.value("stratum.test.late"), None);
        ProcessProperties::set("stratum.test.late", "appeared");
        assert_eq!(source.value("stratum.test.late").as_deref(), Some("appeared"));
        ProcessProperties::remove("stratum.test.late");
    }
}
