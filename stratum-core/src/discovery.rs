//! Plug-in discovery protocol
//!
//! The core never scans for plug-ins itself; the host hands the builder
//! an implementation of [`PluginRegistry`] and the discovery toggles pull
//! sources, source providers and converters from it, scoped by the
//! builder's scope key.

use std::sync::Arc;

use crate::convert::DiscoveredConverter;
use crate::provider::ScopeKey;
use crate::source::{ConfigSource, SourceProvider};

/// Host-supplied enumeration of discoverable plug-ins.
pub trait PluginRegistry: Send + Sync {
    /// All discoverable sources for the scope.
    fn sources(&self, scope: &ScopeKey) -> Vec<Arc<dyn ConfigSource>>;

    /// All discoverable source providers for the scope.
    fn source_providers(&self, scope: &ScopeKey) -> Vec<Arc<dyn SourceProvider>>;

    /// All discoverable converters, each carrying its target type token
    /// and optional priority.
    fn converters(&self, scope: &ScopeKey) -> Vec<DiscoveredConverter>;
}
