//! Derivable target types
//!
//! [`ConfigValue`] is the derivation table: it ships parse recipes for
//! the common scalar shapes and composes recursively for optionals,
//! containers and arrays. It is also the user extension hook; a type
//! that implements it converts without any registration, and an explicit
//! registration always overrides the derived recipe.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::convert::{split, ConverterRegistry};
use crate::error::ConversionError;

/// A type a converter can be derived for.
///
/// Element types of containers are converted back through the registry,
/// so a converter registered for the element type takes effect inside
/// derived containers as well.
pub trait ConfigValue: Sized + 'static {
    /// Parse a raw value, recursing through the registry for elements.
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError>;
}

impl ConfigValue for String {
    fn parse(raw: &str, _registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        Ok(raw.to_string())
    }
}

impl ConfigValue for bool {
    /// True iff the lower-cased raw value is one of `true`, `y`, `yes`,
    /// `on`, `1`. Everything else is false; this recipe never fails.
    fn parse(raw: &str, _registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        Ok(matches!(
            raw.to_lowercase().as_str(),
            "true" | "y" | "yes" | "on" | "1"
        ))
    }
}

macro_rules! config_value_via_from_str {
    ($($target:ty),+ $(,)?) => {$(
        impl ConfigValue for $target {
            fn parse(raw: &str, _registry: &ConverterRegistry) -> Result<Self, ConversionError> {
                raw.parse::<$target>()
                    .map_err(|err| ConversionError::with_cause::<$target>(raw, err))
            }
        }
    )+};
}

config_value_via_from_str! {
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64, char,
    IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr,
    url::Url,
}

impl ConfigValue for PathBuf {
    fn parse(raw: &str, _registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        Ok(PathBuf::from(raw))
    }
}

impl ConfigValue for Duration {
    /// Durations use the `humantime` notation: `30s`, `250ms`, `5m`.
    fn parse(raw: &str, _registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        raw.parse::<humantime::Duration>()
            .map(Into::into)
            .map_err(|err| ConversionError::with_cause::<Duration>(raw, err))
    }
}

impl<E: ConfigValue> ConfigValue for Option<E> {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        registry
            .convert::<E>(Some(raw))
            .map(Some)
            .map_err(|err| ConversionError::with_cause::<Self>(raw, err))
    }
}

fn convert_elements<E: ConfigValue, C: FromIterator<E>>(
    raw: &str,
    registry: &ConverterRegistry,
) -> Result<C, ConversionError> {
    split(raw)
        .iter()
        .map(|part| {
            registry
                .convert::<E>(Some(part))
                .map_err(|err| ConversionError::with_cause::<C>(raw, err))
        })
        .collect()
}

impl<E: ConfigValue> ConfigValue for Vec<E> {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        convert_elements(raw, registry)
    }
}

impl<E: ConfigValue> ConfigValue for VecDeque<E> {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        convert_elements(raw, registry)
    }
}

impl<E: ConfigValue + Eq + Hash> ConfigValue for HashSet<E> {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        convert_elements(raw, registry)
    }
}

impl<E: ConfigValue + Ord> ConfigValue for BTreeSet<E> {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        convert_elements(raw, registry)
    }
}

impl<E: ConfigValue> ConfigValue for Box<[E]> {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        convert_elements::<E, Vec<E>>(raw, registry).map(Vec::into_boxed_slice)
    }
}

impl<E: ConfigValue, const N: usize> ConfigValue for [E; N] {
    fn parse(raw: &str, registry: &ConverterRegistry) -> Result<Self, ConversionError> {
        let elements: Vec<E> = convert_elements(raw, registry)?;
        let found = elements.len();
        elements.try_into().map_err(|_| {
            ConversionError::with_detail::<Self>(
                raw,
                format!("expected {} element(s), found {}", N, found),
            )
        })
    }
}
