//! Environment variable source

use std::collections::BTreeSet;
use std::env;

use crate::source::ConfigSource;

/// Ordinal of the environment source.
pub const ENVIRONMENT_ORDINAL: i32 = 300;

/// Configuration source backed by the process environment.
///
/// Lookups tolerate the usual naming mismatch between configuration keys
/// and environment variables: the exact name is tried first, then the
/// name with every character outside `[A-Za-z0-9_]` rewritten to `_`,
/// then the upper-cased form of that rewrite. Only the first match
/// returns.
#[derive(Debug, Default)]
pub struct EnvironmentSource;

impl EnvironmentSource {
    /// Create a new environment source.
    pub fn new() -> Self {
        Self
    }
}

fn mangle(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

impl ConfigSource for EnvironmentSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn ordinal(&self) -> i32 {
        ENVIRONMENT_ORDINAL
    }

    fn property_names(&self) -> BTreeSet<String> {
        env::vars().map(|(name, _)| name).collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        if let Ok(value) = env::var(name) {
            return Some(value);
        }
        let mangled = mangle(name);
        if let Ok(value) = env::var(&mangled) {
            return Some(value);
        }
        env::var(mangled.to_uppercase()).ok()
    }
}
