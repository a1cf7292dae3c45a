//! Property-file sources
//!
//! Property files live at a well-known resource path below one or more
//! search roots. Every existing copy of the resource becomes its own
//! source, named after the file it was loaded from.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::properties;
use crate::provider::ScopeKey;
use crate::source::{ConfigSource, DEFAULT_ORDINAL};

/// Well-known resource path searched below every resource root.
pub const RESOURCE_PATH: &str = "META-INF/config.properties";

/// Search roots used when a scope does not declare its own.
pub fn default_search_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("."), PathBuf::from("config")]
}

/// An immutable source over a parsed property set.
#[derive(Debug)]
pub struct PropertiesSource {
    name: String,
    ordinal: i32,
    properties: BTreeMap<String, String>,
}

impl PropertiesSource {
    /// Create a source over the given properties.
    ///
    /// The ordinal is taken from the reserved `config_ordinal` key when
    /// present, otherwise the default of 100 applies.
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        let ordinal = properties::declared_ordinal(&properties).unwrap_or(DEFAULT_ORDINAL);
        Self {
            name: name.into(),
            ordinal,
            properties,
        }
    }

    /// Create a source with an explicit ordinal, ignoring any declared one.
    pub fn with_ordinal(
        name: impl Into<String>,
        ordinal: i32,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            ordinal,
            properties,
        }
    }

    /// Parse property-file bytes into a source.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(name, properties::parse(bytes))
    }
}

impl ConfigSource for PropertiesSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn property_names(&self) -> BTreeSet<String> {
        self.properties.keys().cloned().collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn properties(&self) -> BTreeMap<String, String> {
        self.properties.clone()
    }
}

/// Load a source for every copy of [`RESOURCE_PATH`] visible to the scope.
///
/// The scope's resource roots are searched in order; scopes without roots
/// fall back to [`default_search_roots`]. Missing copies are skipped,
/// unreadable ones surface as I/O errors.
pub fn load_resource_sources(scope: &ScopeKey) -> Result<Vec<Arc<dyn ConfigSource>>> {
    let roots = scope
        .resource_roots()
        .map(<[PathBuf]>::to_vec)
        .unwrap_or_else(default_search_roots);

    let mut sources: Vec<Arc<dyn ConfigSource>> = Vec::new();
    for root in roots {
        let path = root.join(RESOURCE_PATH);
        if !path.is_file() {
            continue;
        }
        tracing::debug!(path = %path.display(), scope = scope.label(), "loading property file");
        let bytes = fs::read(&path)?;
        sources.push(Arc::new(PropertiesSource::from_bytes(
            path.display().to_string(),
            &bytes,
        )));
    }
    Ok(sources)
}
