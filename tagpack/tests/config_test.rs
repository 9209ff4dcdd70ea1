use std::sync::Arc;

use anyhow::Result;
use tagpack::{IntoValue, Serializer, SerializerConfig, TypeTable, Typed};
use tagpack_common::{ComponentKey, LogLevel, LoggingConfig};

#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "cfg", structural)]
struct Reading {
    sensor: String,
    value: f64,
}

#[test]
fn test_config_loads_from_json() -> Result<()> {
    let config: SerializerConfig = serde_json::from_str(
        r#"{
            "name": "from-json",
            "default_adapters": true,
            "compaction": ["cfg.Reading", "chrono.DateTime"],
            "logging": {
                "default_level": "warn",
                "component_levels": {"compaction": "debug"}
            }
        }"#,
    )?;

    assert_eq!(config.name, "from-json");
    assert!(config.default_adapters);
    assert!(config.structural_fallback, "missing fields take defaults");
    let logging = config.logging.clone().expect("logging section");
    assert_eq!(logging.level_for(ComponentKey::Compaction), LogLevel::Debug);
    assert_eq!(logging.level_for(ComponentKey::Registry), LogLevel::Warn);

    let types = Arc::new(TypeTable::new());
    types.register_type::<Reading>();
    let serializer = Serializer::with_registry(config, types);
    assert_eq!(
        serializer.compaction().and_then(|t| t.code_of("cfg.Reading")),
        Some(0)
    );
    assert!(serializer.registered_names().any(|n| n == "chrono.NaiveDate"));

    let reading = Reading {
        sensor: "t1".into(),
        value: 20.5,
    }
    .into_value();
    assert_eq!(serializer.decode(&serializer.encode(&reading)?)?, reading);
    Ok(())
}

#[test]
fn test_config_builder_and_display() -> Result<()> {
    let config = SerializerConfig::new("built")
        .with_default_adapters(false)
        .with_structural_fallback(false)
        .with_compaction(["a.A", "b.B"])
        .with_logging_config(LoggingConfig::default_info());

    assert_eq!(
        config.to_string(),
        "SerializerConfig: name:built default_adapters:false structural_fallback:false compaction:2 names"
    );

    let json = serde_json::to_string(&config)?;
    let back: SerializerConfig = serde_json::from_str(&json)?;
    assert_eq!(back, config);
    Ok(())
}

#[test]
fn test_default_config() {
    let config = SerializerConfig::default();
    assert_eq!(config.name, "tagpack");
    assert!(!config.default_adapters);
    assert!(config.structural_fallback);
    assert!(config.compaction.is_none());

    let serializer = Serializer::new();
    assert_eq!(serializer.registered_names().count(), 0);
    assert!(serializer.compaction().is_none());
}
