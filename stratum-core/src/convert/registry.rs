//! Converter registry
//!
//! Indexed store of converters keyed by target type, with priority-based
//! arbitration and on-demand derivation for types implementing
//! [`ConfigValue`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::convert::{
    ConfigValue, Converter, DiscoveredConverter, ErasedConverter, TypedConverter,
};
use crate::error::{ConfigError, ConversionError, Result};

/// An installed converter: the erased converter plus the priority it was
/// registered at.
pub(crate) struct Registration {
    pub(crate) converter: Arc<dyn ErasedConverter>,
    pub(crate) priority: i32,
    pub(crate) type_name: &'static str,
}

impl From<DiscoveredConverter> for Registration {
    fn from(discovered: DiscoveredConverter) -> Self {
        Registration {
            priority: discovered.priority(),
            type_name: discovered.type_name,
            converter: discovered.converter,
        }
    }
}

/// Converter derived from a type's [`ConfigValue`] recipe.
struct DerivedConverter<T>(PhantomData<fn() -> T>);

impl<T: ConfigValue> ErasedConverter for DerivedConverter<T> {
    fn convert_erased(
        &self,
        raw: &str,
        registry: &ConverterRegistry,
    ) -> std::result::Result<Box<dyn Any>, ConversionError> {
        T::parse(raw, registry).map(|value| Box::new(value) as Box<dyn Any>)
    }
}

struct Inner {
    registrations: HashMap<TypeId, Registration>,
    derived: HashMap<TypeId, Arc<dyn ErasedConverter>>,
}

/// Thread-safe store of converters keyed by target type.
///
/// For a given target type exactly one converter is active at a time:
/// the one with the highest priority among all registrations for it.
/// Derived converters are memoized and always lose to an explicit
/// registration. One mutex guards both the registration map and the
/// derivation cache; it is never held while a converter runs.
pub struct ConverterRegistry {
    inner: Mutex<Inner>,
    closed: AtomicBool,
}

impl ConverterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_registrations(HashMap::new())
    }

    pub(crate) fn with_registrations(registrations: HashMap<TypeId, Registration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                registrations,
                derived: HashMap::new(),
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a converter for target type `T` at the given priority.
    ///
    /// An existing registration with strictly higher priority is kept;
    /// otherwise the new registration replaces it.
    pub fn register<T, C>(&self, converter: C, priority: i32) -> Result<()>
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        if self.is_closed() {
            return Err(ConfigError::Closed);
        }
        let mut inner = self.inner.lock();
        match inner.registrations.get(&TypeId::of::<T>()) {
            Some(existing) if existing.priority > priority => {
                tracing::debug!(
                    target_type = type_name::<T>(),
                    kept = existing.priority,
                    offered = priority,
                    "keeping higher-priority converter registration"
                );
            }
            _ => {
                inner.registrations.insert(
                    TypeId::of::<T>(),
                    Registration {
                        converter: Arc::new(TypedConverter::<T, C>::new(converter)),
                        priority,
                        type_name: type_name::<T>(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Convert a raw value to `T`.
    ///
    /// An absent raw value fails with [`ConfigError::NullInput`]; this is
    /// an internal guard, callers resolve absence before converting. On a
    /// registry miss a converter is derived from `T`'s [`ConfigValue`]
    /// recipe, memoized, and invoked; explicit registrations always win
    /// over derived converters.
    pub fn convert<T: ConfigValue>(&self, raw: Option<&str>) -> Result<T> {
        if self.is_closed() {
            return Err(ConfigError::Closed);
        }
        let raw = raw.ok_or(ConfigError::NullInput)?;
        let converter = self.converter_for::<T>();
        let value = converter.convert_erased(raw, self)?;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(_) => Err(ConversionError::with_detail::<T>(
                raw,
                "converter produced a value of a different type",
            )
            .into()),
        }
    }

    /// Convert through a runtime type token instead of a generic
    /// parameter.
    ///
    /// Without a static type there is no derivation path, so a miss on
    /// both the registration map and the derivation cache fails with
    /// [`ConfigError::UnsupportedType`].
    pub fn convert_any(
        &self,
        raw: Option<&str>,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Box<dyn Any>> {
        if self.is_closed() {
            return Err(ConfigError::Closed);
        }
        let raw = raw.ok_or(ConfigError::NullInput)?;
        let converter = {
            let inner = self.inner.lock();
            inner
                .registrations
                .get(&type_id)
                .map(|registration| Arc::clone(&registration.converter))
                .or_else(|| inner.derived.get(&type_id).map(Arc::clone))
        };
        match converter {
            Some(converter) => Ok(converter.convert_erased(raw, self)?),
            None => Err(ConfigError::UnsupportedType(type_name)),
        }
    }

    /// Close the registry: run the closer of every registered converter,
    /// aggregating failures. Idempotent; conversions after close fail
    /// with [`ConfigError::Closed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let converters: Vec<(&'static str, Arc<dyn ErasedConverter>)> = {
            let inner = self.inner.lock();
            inner
                .registrations
                .values()
                .map(|registration| (registration.type_name, Arc::clone(&registration.converter)))
                .collect()
        };
        let mut errors = Vec::new();
        for (target_type, converter) in converters {
            if let Err(err) = converter.close() {
                tracing::warn!(target_type, error = %err, "converter closer failed");
                errors.push(err);
            }
        }
        ConfigError::aggregate(errors)
    }

    /// Whether [`close`](ConverterRegistry::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn converter_for<T: ConfigValue>(&self) -> Arc<dyn ErasedConverter> {
        let mut inner = self.inner.lock();
        if let Some(registration) = inner.registrations.get(&TypeId::of::<T>()) {
            return Arc::clone(&registration.converter);
        }
        Arc::clone(
            inner
                .derived
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(DerivedConverter::<T>(PhantomData))),
        )
    }

    #[cfg(test)]
    fn derived_converter(&self, type_id: TypeId) -> Option<Arc<dyn ErasedConverter>> {
        self.inner.lock().derived.get(&type_id).map(Arc::clone)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
