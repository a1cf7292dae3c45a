//! Configuration builder
//!
//! Accumulates sources and converter registrations, then produces an
//! immutable [`Configuration`]. The default-source and discovery toggles
//! are idempotent; explicit entries append in call order and are
//! arbitrated by priority at build time.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Configuration;
use crate::convert::registry::Registration;
use crate::convert::{compare_converters, Converter, ConverterRegistry, DiscoveredConverter};
use crate::discovery::PluginRegistry;
use crate::error::Result;
use crate::provider::{ProviderRegistry, ScopeKey};
use crate::source::ConfigSource;
use crate::sources::{load_resource_sources, EnvironmentSource, ProcessPropertySource};

/// Fluent builder for [`Configuration`] instances.
pub struct ConfigurationBuilder {
    add_default_sources: bool,
    add_discovered_sources: bool,
    add_discovered_converters: bool,
    sources: Vec<Arc<dyn ConfigSource>>,
    converters: Vec<DiscoveredConverter>,
    scope: ScopeKey,
    bind: bool,
    discovery: Option<Arc<dyn PluginRegistry>>,
    registry: Option<Arc<ProviderRegistry>>,
}

impl ConfigurationBuilder {
    /// Create a builder scoped to the ambient scope.
    pub fn new() -> Self {
        Self {
            add_default_sources: false,
            add_discovered_sources: false,
            add_discovered_converters: false,
            sources: Vec::new(),
            converters: Vec::new(),
            scope: ScopeKey::ambient(),
            bind: false,
            discovery: None,
            registry: None,
        }
    }

    /// Include the default sources: process properties, environment and
    /// every property file at the well-known resource path.
    pub fn add_default_sources(mut self) -> Self {
        self.add_default_sources = true;
        self
    }

    /// Include every source and source-provider result from the plug-in
    /// registry, scoped by this builder's scope key.
    pub fn add_discovered_sources(mut self) -> Self {
        self.add_discovered_sources = true;
        self
    }

    /// Seed the converter registry with every discovered converter.
    pub fn add_discovered_converters(mut self) -> Self {
        self.add_discovered_converters = true;
        self
    }

    /// Append an explicit source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Append explicit, already-shared sources.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Arc<dyn ConfigSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Append an explicit converter registration for target type `T`.
    pub fn with_converter<T, C>(mut self, priority: i32, converter: C) -> Self
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        self.converters
            .push(DiscoveredConverter::new::<T, C>(converter).with_priority(priority));
        self
    }

    /// Append explicit converter registrations in envelope form.
    pub fn with_converters(
        mut self,
        converters: impl IntoIterator<Item = DiscoveredConverter>,
    ) -> Self {
        self.converters.extend(converters);
        self
    }

    /// Supply the host's plug-in registry backing the discovery toggles.
    pub fn with_discovery(mut self, discovery: Arc<dyn PluginRegistry>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Scope the configuration to `scope` and bind it under that key in
    /// the provider registry when it is built.
    pub fn for_scope(mut self, scope: ScopeKey) -> Self {
        self.scope = scope;
        self.bind = true;
        self
    }

    /// Register into this provider registry instead of the global one.
    /// Only meaningful together with [`for_scope`](Self::for_scope).
    pub fn in_registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Scope default-source and discovery resolution to `scope` without
    /// binding the built configuration to it.
    pub fn scoped(mut self, scope: ScopeKey) -> Self {
        self.scope = scope;
        self
    }

    /// Snapshot the accumulated sources and converters into an immutable
    /// [`Configuration`].
    pub fn build(self) -> Result<Arc<Configuration>> {
        let mut sources: Vec<Arc<dyn ConfigSource>> = Vec::new();

        if self.add_default_sources {
            sources.push(Arc::new(ProcessPropertySource::new()));
            sources.push(Arc::new(EnvironmentSource::new()));
            sources.extend(load_resource_sources(&self.scope)?);
        }

        if self.add_discovered_sources {
            if let Some(discovery) = &self.discovery {
                sources.extend(discovery.sources(&self.scope));
                for provider in discovery.source_providers(&self.scope) {
                    sources.extend(provider.sources_for(&self.scope));
                }
            }
        }

        sources.extend(self.sources);

        let mut registrations: HashMap<TypeId, Registration> = HashMap::new();

        if self.add_discovered_converters {
            if let Some(discovery) = &self.discovery {
                let mut discovered = discovery.converters(&self.scope);
                // Highest priority first; the stable sort keeps discovery
                // order among equal priorities, and the first entry per
                // type wins below.
                discovered.sort_by(compare_converters);
                for converter in discovered {
                    let type_id = converter.type_id;
                    registrations
                        .entry(type_id)
                        .or_insert_with(|| Registration::from(converter));
                }
            }
        }

        for explicit in self.converters {
            let type_id = explicit.type_id;
            match registrations.get(&type_id) {
                Some(existing) if explicit.priority() <= existing.priority => {
                    tracing::debug!(
                        target_type = explicit.target_type_name(),
                        kept = existing.priority,
                        offered = explicit.priority(),
                        "keeping stored converter registration"
                    );
                }
                _ => {
                    registrations.insert(type_id, Registration::from(explicit));
                }
            }
        }

        let config = Arc::new(Configuration::new(
            sources,
            ConverterRegistry::with_registrations(registrations),
        ));

        if self.bind {
            let registry = self.registry.unwrap_or_else(ProviderRegistry::global);
            registry.register(Arc::clone(&config), &self.scope)?;
        }

        Ok(config)
    }
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
