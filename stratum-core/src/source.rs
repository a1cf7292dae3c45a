//! Configuration source SPI
//!
//! A source is an opaque provider of string-to-string lookups with a
//! display name and a signed ordinal. Higher ordinals win during lookup.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::Result;
use crate::provider::ScopeKey;

/// Ordinal assumed for sources that do not declare one.
pub const DEFAULT_ORDINAL: i32 = 100;

/// A named, ordinal-tagged provider of configuration properties.
///
/// Implementations are externally owned and must be individually
/// thread-safe; the configuration does not lock around them. A lookup by
/// name must be consistent with membership in [`property_names`] at the
/// same instant, and the ordinal must be stable over the source's
/// lifetime.
///
/// [`property_names`]: ConfigSource::property_names
pub trait ConfigSource: Send + Sync {
    /// Display name of this source. Used for ordering ties and logging.
    fn name(&self) -> &str;

    /// Signed priority of this source; higher beats lower.
    fn ordinal(&self) -> i32 {
        DEFAULT_ORDINAL
    }

    /// Snapshot of the property names this source currently provides.
    fn property_names(&self) -> BTreeSet<String>;

    /// Look up a single property. Returns `None` when the property is
    /// unknown, never an empty string standing in for absence.
    fn value(&self, name: &str) -> Option<String>;

    /// Semantic snapshot of all properties. The default resolves every
    /// name through [`value`](ConfigSource::value).
    fn properties(&self) -> BTreeMap<String, String> {
        self.property_names()
            .into_iter()
            .filter_map(|name| self.value(&name).map(|value| (name, value)))
            .collect()
    }

    /// Optional closer, invoked by `Configuration::close`.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Produces zero or more sources for a scope key.
///
/// Source providers are handed to the builder through the discovery
/// protocol; the core never instantiates them itself.
pub trait SourceProvider: Send + Sync {
    /// The sources this provider contributes for the given scope.
    fn sources_for(&self, scope: &ScopeKey) -> Vec<Arc<dyn ConfigSource>>;
}

/// Compare two sources for chain order: higher ordinal first, then name
/// lexicographically ascending.
///
/// This ordering is deliberately inconsistent with equality: two distinct
/// sources with the same ordinal and name compare as equal, and their
/// relative order is whatever the (stable) sort left them in.
pub fn compare_sources(a: &dyn ConfigSource, b: &dyn ConfigSource) -> Ordering {
    match b.ordinal().cmp(&a.ordinal()) {
        Ordering::Equal => a.name().cmp(b.name()),
        unequal => unequal,
    }
}

/// Stable-sort a source chain into lookup order.
pub(crate) fn sort_sources(sources: &mut [Arc<dyn ConfigSource>]) {
    sources.sort_by(|a, b| compare_sources(a.as_ref(), b.as_ref()));
}
