//! End-to-end scenarios exercising the whole stack through the public API

use std::fs;
use std::sync::Arc;

use stratum_core::prelude::*;
use stratum_core::{DiscoveredConverter, ProcessProperties, SourceProvider};
use stratum_testing::{MapSource, StaticPlugins};

fn parse_i32(raw: &str) -> std::result::Result<i32, ConversionError> {
    raw.parse::<i32>()
        .map_err(|err| ConversionError::with_cause::<i32>(raw, err))
}

/// Scenario 1: an environment variable is found through name mangling and
/// converted through the derived integer recipe.
#[test]
fn test_env_var_lookup_with_mangling() {
    std::env::set_var("MY_INT_PROPERTY", "45");

    let config = ConfigurationBuilder::new()
        .add_default_sources()
        .build()
        .unwrap();
    assert_eq!(config.get_value::<i32>("my_int_property").unwrap(), 45);

    std::env::remove_var("MY_INT_PROPERTY");
}

/// Scenario 2: the process property source (ordinal 400) shadows a
/// property file at the default ordinal.
#[test]
fn test_process_properties_shadow_property_file() {
    let dir = tempfile::tempdir().unwrap();
    let resource_dir = dir.path().join("META-INF");
    fs::create_dir_all(&resource_dir).unwrap();
    fs::write(resource_dir.join("config.properties"), "color=red\n").unwrap();

    ProcessProperties::set("color", "blue");

    let scope = ScopeKey::with_resource_roots("scenario-2", vec![dir.path().to_path_buf()]);
    let config = ConfigurationBuilder::new()
        .add_default_sources()
        .for_scope(scope.clone())
        .build()
        .unwrap();

    assert_eq!(config.get_value::<String>("color").unwrap(), "blue");

    ProcessProperties::remove("color");
    ProviderRegistry::global().on_scope_end(&scope).unwrap();
}

/// Scenario 2b: with nothing above it, the property file provides the
/// value, and a file-declared ordinal reorders the chain.
#[test]
fn test_property_file_value_and_declared_ordinal() {
    let dir = tempfile::tempdir().unwrap();
    let resource_dir = dir.path().join("META-INF");
    fs::create_dir_all(&resource_dir).unwrap();
    // Ordinal 500 outranks even the process property source.
    fs::write(
        resource_dir.join("config.properties"),
        "config_ordinal=500\nscenario.file.key=from-file\n",
    )
    .unwrap();

    ProcessProperties::set("scenario.file.key", "from-process");

    let scope = ScopeKey::with_resource_roots("scenario-2b", vec![dir.path().to_path_buf()]);
    let config = ConfigurationBuilder::new()
        .add_default_sources()
        .scoped(scope)
        .build()
        .unwrap();

    assert_eq!(
        config.get_value::<String>("scenario.file.key").unwrap(),
        "from-file"
    );

    ProcessProperties::remove("scenario.file.key");
}

/// Scenario 3: a comma-separated raw value converts to a vector of
/// integers.
#[test]
fn test_list_conversion_to_vec() {
    let config = ConfigurationBuilder::new()
        .with_source(MapSource::new("lists").with_entry("ints", "1,2,3"))
        .build()
        .unwrap();
    assert_eq!(config.get_value::<Vec<i32>>("ints").unwrap(), vec![1, 2, 3]);
}

/// Scenario 4: escaped commas survive array conversion.
#[test]
fn test_escaped_comma_in_string_array() {
    let config = ConfigurationBuilder::new()
        .with_source(MapSource::new("lists").with_entry("parts", "a\\,b,c"))
        .build()
        .unwrap();
    let parts = config.get_value::<Box<[String]>>("parts").unwrap();
    assert_eq!(&*parts, &["a,b".to_string(), "c".to_string()]);
}

/// Scenario 5: an explicit converter at priority 200 overrides a
/// discovered converter at the default priority of 100.
#[test]
fn test_explicit_converter_overrides_discovered() {
    let plugins = StaticPlugins::new()
        .with_converter(DiscoveredConverter::new::<i32, _>(|raw: &str| {
            parse_i32(raw).map(|n| n + 100)
        }))
        .shared();

    let config = ConfigurationBuilder::new()
        .with_source(MapSource::new("numbers").with_entry("n", "7"))
        .add_discovered_converters()
        .with_discovery(plugins)
        .with_converter::<i32, _>(200, |raw: &str| parse_i32(raw).map(|n| n + 200))
        .build()
        .unwrap();

    assert_eq!(config.get_value::<i32>("n").unwrap(), 207);
}

/// Scenario 6: releasing one configuration leaves other scopes bound.
#[test]
fn test_release_is_scoped_to_one_configuration() {
    let registry = ProviderRegistry::new();
    let (k1, k2) = (ScopeKey::new("k1"), ScopeKey::new("k2"));

    let c1 = ConfigurationBuilder::new()
        .with_source(MapSource::new("one").with_entry("who", "c1"))
        .for_scope(k1.clone())
        .in_registry(Arc::clone(&registry))
        .build()
        .unwrap();
    let c2 = ConfigurationBuilder::new()
        .with_source(MapSource::new("two").with_entry("who", "c2"))
        .for_scope(k2.clone())
        .in_registry(Arc::clone(&registry))
        .build()
        .unwrap();

    registry.release(&c1).unwrap();

    assert!(c1.is_closed());
    assert!(!c2.is_closed());
    let still_bound = registry.current_for(Some(&k2)).unwrap();
    assert!(Arc::ptr_eq(&still_bound, &c2));
    assert_eq!(still_bound.get_value::<String>("who").unwrap(), "c2");
}

/// Discovered source providers contribute sources under the builder's
/// scope key.
#[test]
fn test_discovered_sources_resolve_by_ordinal() {
    struct PerScopeProvider;

    impl SourceProvider for PerScopeProvider {
        fn sources_for(&self, scope: &ScopeKey) -> Vec<Arc<dyn ConfigSource>> {
            vec![MapSource::with_ordinal("provided", 450)
                .with_entry("origin", format!("provided for {}", scope.label()))
                .shared()]
        }
    }

    let plugins = StaticPlugins::new()
        .with_source(MapSource::with_ordinal("discovered", 50).with_entry("origin", "discovered"))
        .with_provider(PerScopeProvider)
        .shared();

    let scope = ScopeKey::new("tenant-7");
    let config = ConfigurationBuilder::new()
        .add_discovered_sources()
        .with_discovery(plugins)
        .scoped(scope)
        .build()
        .unwrap();

    assert_eq!(
        config.get_value::<String>("origin").unwrap(),
        "provided for tenant-7"
    );
}
