//! Spy converters
//!
//! A spy converter records every raw value it is asked to convert, which
//! is how tests verify that converters are never handed an absent value
//! and that lookups convert exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use stratum_core::{ConversionError, Converter, Result};

/// Observations shared between a [`SpyConverter`] and its test.
#[derive(Clone, Default)]
pub struct SpyHandle {
    seen: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl SpyHandle {
    /// Every raw value the converter was invoked with, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    /// How many conversions ran.
    pub fn invocations(&self) -> usize {
        self.seen.lock().len()
    }

    /// How many times the converter's closer ran.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// A converter that records its inputs before delegating.
pub struct SpyConverter<T> {
    handle: SpyHandle,
    delegate: Box<dyn Fn(&str) -> std::result::Result<T, ConversionError> + Send + Sync>,
}

impl<T> SpyConverter<T> {
    /// Wrap a conversion function, returning the converter and the
    /// handle its observations are read through.
    pub fn new(
        delegate: impl Fn(&str) -> std::result::Result<T, ConversionError> + Send + Sync + 'static,
    ) -> (Self, SpyHandle) {
        let handle = SpyHandle::default();
        let converter = Self {
            handle: handle.clone(),
            delegate: Box::new(delegate),
        };
        (converter, handle)
    }
}

impl<T: Send + Sync> Converter<T> for SpyConverter<T> {
    fn convert(&self, raw: &str) -> std::result::Result<T, ConversionError> {
        self.handle.seen.lock().push(raw.to_string());
        (self.delegate)(raw)
    }

    fn close(&self) -> Result<()> {
        self.handle.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
