//! Error types for the configuration runtime
//!
//! Defines the standard error types used throughout the library.

use std::any::type_name;

/// Error raised by a converter or by converter derivation.
///
/// Carries the raw string that failed to convert and the name of the
/// target type, plus an optional underlying cause.
#[derive(Debug, thiserror::Error)]
#[error("cannot convert {raw:?} to `{target}`{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
pub struct ConversionError {
    raw: String,
    target: &'static str,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    detail: Option<String>,
}

impl ConversionError {
    /// Create a conversion error for a raw value and target type.
    pub fn new<T>(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            target: type_name::<T>(),
            cause: None,
            detail: None,
        }
    }

    /// Create a conversion error with an underlying cause.
    pub fn with_cause<T>(
        raw: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            raw: raw.into(),
            target: type_name::<T>(),
            cause: Some(Box::new(cause)),
            detail: None,
        }
    }

    /// Create a conversion error with a free-form detail message.
    pub fn with_detail<T>(raw: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            target: type_name::<T>(),
            cause: None,
            detail: Some(detail.into()),
        }
    }

    /// The raw value that failed to convert.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The name of the target type.
    pub fn target(&self) -> &'static str {
        self.target
    }
}

/// Standard error type for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No source provides a value for the requested property.
    #[error("no configured value for property `{0}`")]
    Missing(String),

    /// A converter or converter derivation failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// No converter is registered for the target type and no derivation
    /// path exists for it.
    #[error("no converter registered for type `{0}`")]
    UnsupportedType(&'static str),

    /// A converter was invoked with an absent raw value. This is an
    /// internal guard and indicates a library bug, not a user error.
    #[error("converter invoked with an absent raw value")]
    NullInput,

    /// A configuration is already bound to the given scope key.
    #[error("a configuration is already bound to scope `{0}`")]
    AlreadyBound(String),

    /// Operation on a configuration or registry that has been closed.
    #[error("configuration has been closed")]
    Closed,

    /// I/O error while loading a property-file source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cleanup pass (close or release) completed with errors. The
    /// first error is primary; the rest are attached as suppressed
    /// children.
    #[error("cleanup failed: {primary} ({} suppressed error(s))", .suppressed.len())]
    Aggregate {
        /// The first error raised during the cleanup pass.
        primary: Box<ConfigError>,
        /// Errors raised after the first one.
        suppressed: Vec<ConfigError>,
    },
}

impl ConfigError {
    /// Fold a list of cleanup errors into a single error, if any.
    ///
    /// One error is surfaced unchanged; two or more become an
    /// [`ConfigError::Aggregate`] with the first as primary.
    pub(crate) fn aggregate(errors: Vec<ConfigError>) -> Result<()> {
        let mut iter = errors.into_iter();
        let Some(primary) = iter.next() else {
            return Ok(());
        };
        let suppressed: Vec<ConfigError> = iter.collect();
        if suppressed.is_empty() {
            Err(primary)
        } else {
            Err(ConfigError::Aggregate {
                primary: Box::new(primary),
                suppressed,
            })
        }
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::new::<i32>("abc");
        assert_eq!(format!("{}", err), "cannot convert \"abc\" to `i32`");

        let err = ConversionError::with_detail::<bool>("x", "expected a flag");
        assert_eq!(
            format!("{}", err),
            "cannot convert \"x\" to `bool`: expected a flag"
        );
    }

    #[test]
    fn test_conversion_error_cause_is_source() {
        let cause = "7f".parse::<i32>().unwrap_err();
        let err = ConversionError::with_cause::<i32>("7f", cause);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_aggregate_empty_is_ok() {
        assert!(ConfigError::aggregate(Vec::new()).is_ok());
    }

    #[test]
    fn test_aggregate_single_error_is_unchanged() {
        let result = ConfigError::aggregate(vec![ConfigError::Closed]);
        assert!(matches!(result, Err(ConfigError::Closed)));
    }

    #[test]
    fn test_aggregate_many_errors_keeps_first_primary() {
        let result = ConfigError::aggregate(vec![
            ConfigError::Missing("a".to_string()),
            ConfigError::Closed,
            ConfigError::NullInput,
        ]);
        match result {
            Err(ConfigError::Aggregate { primary, suppressed }) => {
                assert!(matches!(*primary, ConfigError::Missing(_)));
                assert_eq!(suppressed.len(), 2);
            }
            other => panic!("expected aggregate error, got {:?}", other),
        }
    }
}
