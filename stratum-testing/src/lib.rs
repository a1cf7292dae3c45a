//! # Stratum Testing
//!
//! Test utilities for the configuration runtime:
//! - Scripted in-memory sources with close tracking
//! - Spy converters that record every raw value they see
//! - A static plug-in registry for exercising the discovery toggles

pub mod discovery;
pub mod sources;
pub mod spies;

pub use discovery::StaticPlugins;
pub use sources::MapSource;
pub use spies::{SpyConverter, SpyHandle};
