//! Type conversion subsystem
//!
//! Converters turn non-null raw strings into typed values. A converter
//! registry arbitrates between registrations by priority and derives
//! converters on demand for types that implement [`ConfigValue`].

pub mod registry;
pub mod split;
pub mod value;

use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ConversionError, Result};

pub use registry::ConverterRegistry;
pub use split::split;
pub use value::ConfigValue;

/// Priority assumed for registrations that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A function from a non-null raw string to a typed value.
///
/// Converters are never invoked with an absent raw value; they either
/// return a value of the declared type or fail with a
/// [`ConversionError`]. Priority belongs to the registration, not to the
/// converter object, so one converter instance may be registered at
/// different priorities in different registries.
pub trait Converter<T>: Send + Sync {
    /// Convert the raw value.
    fn convert(&self, raw: &str) -> std::result::Result<T, ConversionError>;

    /// Optional closer, invoked when the owning registry closes.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<T, F> Converter<T> for F
where
    F: Fn(&str) -> std::result::Result<T, ConversionError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> std::result::Result<T, ConversionError> {
        self(raw)
    }
}

/// Object-safe form of [`Converter`] used for registry storage.
pub(crate) trait ErasedConverter: Send + Sync {
    fn convert_erased(
        &self,
        raw: &str,
        registry: &ConverterRegistry,
    ) -> std::result::Result<Box<dyn Any>, ConversionError>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Adapter from a typed converter to the erased storage form.
pub(crate) struct TypedConverter<T, C> {
    inner: C,
    _target: PhantomData<fn() -> T>,
}

impl<T, C> TypedConverter<T, C> {
    pub(crate) fn new(inner: C) -> Self {
        Self {
            inner,
            _target: PhantomData,
        }
    }
}

impl<T, C> ErasedConverter for TypedConverter<T, C>
where
    T: 'static,
    C: Converter<T>,
{
    fn convert_erased(
        &self,
        raw: &str,
        _registry: &ConverterRegistry,
    ) -> std::result::Result<Box<dyn Any>, ConversionError> {
        self.inner
            .convert(raw)
            .map(|value| Box::new(value) as Box<dyn Any>)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}

/// A converter received from discovery, carrying its target type token.
///
/// Rust erases type parameters at compile time, so discovered converters
/// travel in this envelope: the generic constructor captures the target
/// type as a runtime token, and the optional priority stands in for the
/// host's priority annotation (default 100).
#[derive(Clone)]
pub struct DiscoveredConverter {
    pub(crate) converter: Arc<dyn ErasedConverter>,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    priority: Option<i32>,
}

impl DiscoveredConverter {
    /// Wrap a converter for target type `T`.
    pub fn new<T, C>(converter: C) -> Self
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        Self {
            converter: Arc::new(TypedConverter::<T, C>::new(converter)),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            priority: None,
        }
    }

    /// Declare an explicit priority for this registration.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The effective priority of this registration.
    pub fn priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    /// Name of the target type, for diagnostics.
    pub fn target_type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for DiscoveredConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredConverter")
            .field("target", &self.type_name)
            .field("priority", &self.priority())
            .finish()
    }
}

/// Compare two discovered registrations: higher priority first.
///
/// Like the source comparator, this ordering is inconsistent with
/// equality: registrations with equal priorities are indistinguishable
/// to it regardless of their converters or target types.
pub fn compare_converters(a: &DiscoveredConverter, b: &DiscoveredConverter) -> Ordering {
    b.priority().cmp(&a.priority())
}
