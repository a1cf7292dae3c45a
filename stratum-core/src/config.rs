//! The configuration view
//!
//! A `Configuration` holds a sorted, immutable chain of sources and a
//! converter registry. Lookups walk the chain in priority order and
//! convert the first raw value found; nothing is cached, every read goes
//! back to the sources.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::convert::{ConfigValue, ConverterRegistry};
use crate::error::{ConfigError, Result};
use crate::source::{sort_sources, ConfigSource};

/// A single logical view over a chain of configuration sources.
///
/// The source chain is fixed at build time; concurrent readers observe
/// the same order. After [`close`](Configuration::close) every operation
/// except [`is_closed`](Configuration::is_closed) fails with
/// [`ConfigError::Closed`].
pub struct Configuration {
    sources: Vec<Arc<dyn ConfigSource>>,
    converters: ConverterRegistry,
    closed: AtomicBool,
}

impl Configuration {
    /// Assemble a configuration; the source chain is sorted here so the
    /// stored order is always the lookup order.
    pub(crate) fn new(
        mut sources: Vec<Arc<dyn ConfigSource>>,
        converters: ConverterRegistry,
    ) -> Self {
        sort_sources(&mut sources);
        Self {
            sources,
            converters,
            closed: AtomicBool::new(false),
        }
    }

    /// The value for `name`, converted to `T`.
    ///
    /// Fails with [`ConfigError::Missing`] when no source provides the
    /// property. An empty string is a present value.
    pub fn get_value<T: ConfigValue>(&self, name: &str) -> Result<T> {
        self.get_optional_value(name)?
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    /// The value for `name`, converted to `T`, or `None` when no source
    /// provides the property.
    ///
    /// Sources are walked in the stored order; the first non-absent raw
    /// value wins and is converted. Conversion failures surface to the
    /// caller unchanged.
    pub fn get_optional_value<T: ConfigValue>(&self, name: &str) -> Result<Option<T>> {
        self.ensure_open()?;
        for source in &self.sources {
            if let Some(raw) = source.value(name) {
                return self.converters.convert::<T>(Some(&raw)).map(Some);
            }
        }
        Ok(None)
    }

    /// Snapshot union of the property names across all sources at call
    /// time; duplicates coalesce.
    pub fn property_names(&self) -> Result<BTreeSet<String>> {
        self.ensure_open()?;
        let mut names = BTreeSet::new();
        for source in &self.sources {
            names.extend(source.property_names());
        }
        Ok(names)
    }

    /// Immutable snapshot of the source chain in lookup order.
    pub fn sources(&self) -> Result<Vec<Arc<dyn ConfigSource>>> {
        self.ensure_open()?;
        Ok(self.sources.clone())
    }

    /// Convert a raw value through this configuration's converter
    /// registry.
    pub fn convert<T: ConfigValue>(&self, raw: Option<&str>) -> Result<T> {
        self.ensure_open()?;
        self.converters.convert(raw)
    }

    /// The converter registry backing this configuration.
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Close this configuration: run the closer of every source, then
    /// close the converter registry, aggregating failures. Idempotent.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut errors = Vec::new();
        for source in &self.sources {
            if let Err(err) = source.close() {
                tracing::warn!(source = source.name(), error = %err, "source closer failed");
                errors.push(err);
            }
        }
        if let Err(err) = self.converters.close() {
            errors.push(err);
        }
        ConfigError::aggregate(errors)
    }

    /// Whether [`close`](Configuration::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(ConfigError::Closed)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("Configuration")
            .field("sources", &names)
            .field("closed", &self.is_closed())
            .finish()
    }
}
