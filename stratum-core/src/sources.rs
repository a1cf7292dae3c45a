//! Built-in configuration sources
//!
//! The default source set: process properties (ordinal 400), environment
//! variables (ordinal 300) and property files loaded from the well-known
//! resource path (ordinal 100 unless the file declares one).

pub mod env;
pub mod file;
pub mod process;

pub use env::EnvironmentSource;
pub use file::{default_search_roots, load_resource_sources, PropertiesSource, RESOURCE_PATH};
pub use process::{ProcessProperties, ProcessPropertySource};
