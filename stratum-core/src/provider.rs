//! Provider registry and scope keys
//!
//! The registry is the process-wide directory from scope keys to built
//! configurations. Keys are held weakly: a binding never keeps its scope
//! alive, and a background watcher releases the bound configuration once
//! the scope is gone. Scope owners that want deterministic cleanup can
//! call [`ProviderRegistry::on_scope_end`] instead of waiting for the
//! watcher.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::builder::ConfigurationBuilder;
use crate::config::Configuration;
use crate::discovery::PluginRegistry;
use crate::error::{ConfigError, Result};

static AMBIENT: Lazy<ScopeKey> = Lazy::new(|| ScopeKey::new("ambient"));

static GLOBAL: Lazy<Arc<ProviderRegistry>> = Lazy::new(ProviderRegistry::new);

const WATCHER_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct ScopeInner {
    label: String,
    resource_roots: Option<Vec<PathBuf>>,
}

/// An opaque identity token under which a configuration can be
/// registered.
///
/// Clones share identity; two keys are the same scope iff they clone
/// from the same origin. A scope dies when its last clone is dropped.
/// The optional resource roots bound the well-known property-file lookup
/// for configurations built for this scope.
#[derive(Clone, Debug)]
pub struct ScopeKey {
    inner: Arc<ScopeInner>,
}

impl ScopeKey {
    /// Create a fresh scope with a debug label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                label: label.into(),
                resource_roots: None,
            }),
        }
    }

    /// Create a fresh scope that resolves the well-known resource path
    /// below the given roots only.
    pub fn with_resource_roots(label: impl Into<String>, roots: Vec<PathBuf>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                label: label.into(),
                resource_roots: Some(roots),
            }),
        }
    }

    /// The process-wide ambient scope. Never collected.
    pub fn ambient() -> Self {
        AMBIENT.clone()
    }

    /// Debug label of this scope.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Resource roots declared for this scope, if any.
    pub fn resource_roots(&self) -> Option<&[PathBuf]> {
        self.inner.resource_roots.as_deref()
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn downgrade(&self) -> WeakScopeKey {
        WeakScopeKey {
            weak: Arc::downgrade(&self.inner),
            id: self.id(),
            label: self.inner.label.clone(),
        }
    }
}

impl PartialEq for ScopeKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ScopeKey {}

/// A scope key held without keeping the scope alive.
struct WeakScopeKey {
    weak: Weak<ScopeInner>,
    id: usize,
    label: String,
}

impl WeakScopeKey {
    fn is_alive(&self) -> bool {
        self.weak.strong_count() > 0
    }
}

struct Binding {
    scope: WeakScopeKey,
    config: Arc<Configuration>,
}

/// Process-wide directory of scope-key → configuration bindings.
///
/// All mutation happens under one mutex; the lock is always dropped
/// before source or converter closers run, so releasing a configuration
/// from within a closer cannot deadlock.
pub struct ProviderRegistry {
    state: Mutex<Vec<Binding>>,
    discovery: Mutex<Option<Arc<dyn PluginRegistry>>>,
    closed: AtomicBool,
    watcher_stop: Arc<AtomicBool>,
}

impl ProviderRegistry {
    /// Create a registry with its own watcher thread.
    pub fn new() -> Arc<Self> {
        let registry = Arc::new(Self {
            state: Mutex::new(Vec::new()),
            discovery: Mutex::new(None),
            closed: AtomicBool::new(false),
            watcher_stop: Arc::new(AtomicBool::new(false)),
        });
        Self::spawn_watcher(&registry);
        registry
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Install the plug-in registry used when `current*` builds a
    /// default configuration.
    pub fn set_discovery(&self, discovery: Arc<dyn PluginRegistry>) {
        *self.discovery.lock() = Some(discovery);
    }

    /// The configuration bound to the ambient scope, built with all
    /// defaults on first use.
    pub fn current(&self) -> Result<Arc<Configuration>> {
        self.current_for(None)
    }

    /// The configuration bound to the given scope (`None` means the
    /// ambient scope), built with all defaults and registered atomically
    /// on first use.
    pub fn current_for(&self, scope: Option<&ScopeKey>) -> Result<Arc<Configuration>> {
        self.ensure_open()?;
        let ambient = ScopeKey::ambient();
        let scope = scope.unwrap_or(&ambient);

        // The first caller for a scope builds the default configuration
        // under the registry lock; concurrent callers block briefly and
        // then observe the same instance.
        let mut state = self.state.lock();
        if let Some(binding) = state
            .iter()
            .find(|binding| binding.scope.id == scope.id() && binding.scope.is_alive())
        {
            return Ok(Arc::clone(&binding.config));
        }

        let mut builder = ConfigurationBuilder::new()
            .add_default_sources()
            .add_discovered_sources()
            .add_discovered_converters()
            .scoped(scope.clone());
        if let Some(discovery) = self.discovery.lock().clone() {
            builder = builder.with_discovery(discovery);
        }
        let config = builder.build()?;
        state.push(Binding {
            scope: scope.downgrade(),
            config: Arc::clone(&config),
        });
        tracing::debug!(scope = scope.label(), "built default configuration for scope");
        Ok(config)
    }

    /// Bind `config` under `scope`.
    ///
    /// Fails with [`ConfigError::AlreadyBound`] while another
    /// configuration is live under the same key. A configuration may be
    /// registered under several scopes at once.
    pub fn register(&self, config: Arc<Configuration>, scope: &ScopeKey) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if state
            .iter()
            .any(|binding| binding.scope.id == scope.id() && binding.scope.is_alive())
        {
            return Err(ConfigError::AlreadyBound(scope.label().to_string()));
        }
        state.push(Binding {
            scope: scope.downgrade(),
            config,
        });
        tracing::debug!(scope = scope.label(), "registered configuration");
        Ok(())
    }

    /// Remove every binding that points to `config` (by identity), then
    /// close it. A configuration with no bindings is left untouched, so
    /// a closer that releases its own configuration recurses harmlessly.
    pub fn release(&self, config: &Arc<Configuration>) -> Result<()> {
        let removed = {
            let mut state = self.state.lock();
            let before = state.len();
            state.retain(|binding| !Arc::ptr_eq(&binding.config, config));
            before - state.len()
        };
        if removed == 0 {
            return Ok(());
        }
        tracing::debug!(bindings = removed, "releasing configuration");
        config.close()
    }

    /// Explicit lifetime-end signal from a scope owner: release whatever
    /// is bound under `scope`, exactly as the watcher would have.
    pub fn on_scope_end(&self, scope: &ScopeKey) -> Result<()> {
        let bound: Vec<Arc<Configuration>> = {
            let state = self.state.lock();
            state
                .iter()
                .filter(|binding| binding.scope.id == scope.id())
                .map(|binding| Arc::clone(&binding.config))
                .collect()
        };
        let mut errors = Vec::new();
        for config in bound {
            if let Err(err) = self.release(&config) {
                errors.push(err);
            }
        }
        ConfigError::aggregate(errors)
    }

    /// Release every registered configuration, aggregating failures,
    /// and stop the watcher. Idempotent; the second call performs no
    /// additional releases.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.watcher_stop.store(true, Ordering::Relaxed);

        let configs: Vec<Arc<Configuration>> = {
            let state = self.state.lock();
            let mut unique: Vec<Arc<Configuration>> = Vec::new();
            for binding in state.iter() {
                if !unique.iter().any(|config| Arc::ptr_eq(config, &binding.config)) {
                    unique.push(Arc::clone(&binding.config));
                }
            }
            unique
        };

        let mut errors = Vec::new();
        for config in configs {
            if let Err(err) = self.release(&config) {
                errors.push(err);
            }
        }
        ConfigError::aggregate(errors)
    }

    /// Whether [`close`](ProviderRegistry::close) has been called.
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

    fn spawn_watcher(registry: &Arc<Self>) {
        let weak = Arc::downgrade(registry);
        let stop = Arc::clone(&registry.watcher_stop);
        let spawned = thread::Builder::new()
            .name("stratum-scope-watcher".to_string())
            .spawn(move || loop {
                thread::sleep(WATCHER_INTERVAL);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let Some(registry) = weak.upgrade() else {
                    break;
                };
                registry.sweep();
            });
        if let Err(err) = spawned {
            tracing::warn!(error = %err, "failed to spawn scope watcher");
        }
    }

    /// Release the configuration of every binding whose scope has died.
    fn sweep(&self) {
        loop {
            let dead = {
                let state = self.state.lock();
                state
                    .iter()
                    .find(|binding| !binding.scope.is_alive())
                    .map(|binding| (binding.scope.label.clone(), Arc::clone(&binding.config)))
            };
            let Some((label, config)) = dead else {
                break;
            };
            tracing::debug!(scope = %label, "scope collected; releasing bound configuration");
            if let Err(err) = self.release(&config) {
                tracing::warn!(scope = %label, error = %err, "auto-release failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConverterRegistry;
    use std::time::Instant;

    fn empty_config() -> Arc<Configuration> {
        Arc::new(Configuration::new(Vec::new(), ConverterRegistry::new()))
    }

    fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        check()
    }

    #[test]
    fn test_scope_key_identity() {
        let scope = ScopeKey::new("tenant-a");
        let alias = scope.clone();
        let other = ScopeKey::new("tenant-a");
        assert_eq!(scope, alias);
        assert_ne!(scope, other);
        assert_eq!(scope.label(), "tenant-a");
    }

    #[test]
    fn test_ambient_scope_is_shared() {
        assert_eq!(ScopeKey::ambient(), ScopeKey::ambient());
    }

    #[test]
    fn test_register_rejects_second_binding_for_live_scope() {
        let registry = ProviderRegistry::new();
        let scope = ScopeKey::new("k");
        registry.register(empty_config(), &scope).unwrap();
        let result = registry.register(empty_config(), &scope);
        assert!(matches!(result, Err(ConfigError::AlreadyBound(label)) if label == "k"));
    }

    #[test]
    fn test_release_removes_only_bindings_of_that_configuration() {
        let registry = ProviderRegistry::new();
        let (k1, k2) = (ScopeKey::new("k1"), ScopeKey::new("k2"));
        let (c1, c2) = (empty_config(), empty_config());
        registry.register(Arc::clone(&c1), &k1).unwrap();
        registry.register(Arc::clone(&c2), &k2).unwrap();

        registry.release(&c1).unwrap();
        assert!(c1.is_closed());
        assert!(!c2.is_closed());
        // k1 is free again, k2 still taken.
        registry.register(empty_config(), &k1).unwrap();
        assert!(registry.register(empty_config(), &k2).is_err());
    }

    #[test]
    fn test_release_removes_every_binding_of_a_shared_configuration() {
        let registry = ProviderRegistry::new();
        let (k1, k2) = (ScopeKey::new("k1"), ScopeKey::new("k2"));
        let shared = empty_config();
        registry.register(Arc::clone(&shared), &k1).unwrap();
        registry.register(Arc::clone(&shared), &k2).unwrap();

        registry.release(&shared).unwrap();
        assert!(shared.is_closed());
        registry.register(empty_config(), &k1).unwrap();
        registry.register(empty_config(), &k2).unwrap();
    }

    #[test]
    fn test_release_of_unregistered_configuration_is_a_no_op() {
        let registry = ProviderRegistry::new();
        let config = empty_config();
        registry.release(&config).unwrap();
        assert!(!config.is_closed());
    }

    #[test]
    fn test_current_builds_once_per_scope() {
        let registry = ProviderRegistry::new();
        let scope = ScopeKey::new("current-scope");
        let first = registry.current_for(Some(&scope)).unwrap();
        let second = registry.current_for(Some(&scope)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let elsewhere = ScopeKey::new("other-scope");
        let third = registry.current_for(Some(&elsewhere)).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_current_for_none_uses_ambient_scope() {
        let registry = ProviderRegistry::new();
        let implicit = registry.current().unwrap();
        let explicit = registry.current_for(Some(&ScopeKey::ambient())).unwrap();
        assert!(Arc::ptr_eq(&implicit, &explicit));
        registry.close().unwrap();
    }

    #[test]
    fn test_on_scope_end_releases_binding() {
        let registry = ProviderRegistry::new();
        let scope = ScopeKey::new("ending");
        let config = empty_config();
        registry.register(Arc::clone(&config), &scope).unwrap();

        registry.on_scope_end(&scope).unwrap();
        assert!(config.is_closed());
        registry.register(empty_config(), &scope).unwrap();
    }

    #[test]
    fn test_watcher_releases_dead_scope() {
        let registry = ProviderRegistry::new();
        let config = empty_config();
        {
            let scope = ScopeKey::new("short-lived");
            registry.register(Arc::clone(&config), &scope).unwrap();
        }
        assert!(
            wait_until(Duration::from_secs(2), || config.is_closed()),
            "watcher did not release the configuration of a dead scope"
        );
    }

    #[test]
    fn test_close_releases_everything_and_is_idempotent() {
        let registry = ProviderRegistry::new();
        let (c1, c2) = (empty_config(), empty_config());
        registry.register(Arc::clone(&c1), &ScopeKey::new("k1")).unwrap();
        registry.register(Arc::clone(&c2), &ScopeKey::new("k2")).unwrap();

        registry.close().unwrap();
        assert!(c1.is_closed());
        assert!(c2.is_closed());
        assert!(registry.is_closed());
        registry.close().unwrap();

        let result = registry.register(empty_config(), &ScopeKey::new("late"));
        assert!(matches!(result, Err(ConfigError::Closed)));
        assert!(matches!(registry.current(), Err(ConfigError::Closed)));
    }

    #[test]
    fn test_close_counts_shared_configuration_once() {
        let registry = ProviderRegistry::new();
        let shared = empty_config();
        registry.register(Arc::clone(&shared), &ScopeKey::new("k1")).unwrap();
        registry.register(Arc::clone(&shared), &ScopeKey::new("k2")).unwrap();
        registry.close().unwrap();
        assert!(shared.is_closed());
    }
}
