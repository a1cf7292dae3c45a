//! # Stratum Core
//!
//! Layered configuration runtime: a single logical view over a
//! heterogeneous set of prioritized sources, with typed value conversion
//! and a scoped provider registry.
//!
//! A lookup walks the source chain in ordinal order, takes the first raw
//! value it finds and converts it through a priority-arbitrated converter
//! registry. Nothing is cached and no change notifications are offered;
//! every read goes back to the sources.

pub mod builder;
pub mod config;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod properties;
pub mod provider;
pub mod source;
pub mod sources;

pub use builder::ConfigurationBuilder;
pub use config::Configuration;
pub use convert::{
    compare_converters, split, ConfigValue, Converter, ConverterRegistry, DiscoveredConverter,
    DEFAULT_PRIORITY,
};
pub use discovery::PluginRegistry;
pub use error::{ConfigError, ConversionError, Result};
pub use provider::{ProviderRegistry, ScopeKey};
pub use source::{compare_sources, ConfigSource, SourceProvider, DEFAULT_ORDINAL};
pub use sources::{
    EnvironmentSource, ProcessProperties, ProcessPropertySource, PropertiesSource,
};

pub mod prelude {
    //! Common imports for applications reading configuration

    pub use crate::builder::ConfigurationBuilder;
    pub use crate::config::Configuration;
    pub use crate::convert::{ConfigValue, Converter, ConverterRegistry};
    pub use crate::error::{ConfigError, ConversionError, Result};
    pub use crate::provider::{ProviderRegistry, ScopeKey};
    pub use crate::source::ConfigSource;
}
