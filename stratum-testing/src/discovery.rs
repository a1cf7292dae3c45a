//! Static plug-in registry
//!
//! The discovery protocol is host-defined; tests script it with a fixed
//! set of sources, source providers and converters.

use std::sync::Arc;

use stratum_core::{
    ConfigSource, DiscoveredConverter, PluginRegistry, ScopeKey, SourceProvider,
};

/// A [`PluginRegistry`] serving fixed plug-in sets to every scope.
#[derive(Default)]
pub struct StaticPlugins {
    sources: Vec<Arc<dyn ConfigSource>>,
    providers: Vec<Arc<dyn SourceProvider>>,
    converters: Vec<DiscoveredConverter>,
}

impl StaticPlugins {
    /// Create an empty plug-in registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a discoverable source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add a discoverable source provider.
    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add a discoverable converter.
    pub fn with_converter(mut self, converter: DiscoveredConverter) -> Self {
        self.converters.push(converter);
        self
    }

    /// This registry as a shared trait object.
    pub fn shared(self) -> Arc<dyn PluginRegistry> {
        Arc::new(self)
    }
}

impl PluginRegistry for StaticPlugins {
    fn sources(&self, _scope: &ScopeKey) -> Vec<Arc<dyn ConfigSource>> {
        self.sources.clone()
    }

    fn source_providers(&self, _scope: &ScopeKey) -> Vec<Arc<dyn SourceProvider>> {
        self.providers.clone()
    }

    fn converters(&self, _scope: &ScopeKey) -> Vec<DiscoveredConverter> {
        self.converters.clone()
    }
}
