use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use tagpack::{
    ClassTag, Envelope, IntoValue, Serializer, SerializerConfig, TypeTable, Typed, Value,
};

#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "geo", structural)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "geo", structural)]
struct Route(Coord, Coord);

fn serializer(config: SerializerConfig) -> Serializer {
    let types = Arc::new(TypeTable::new());
    types.register_type::<Coord>();
    types.register_type::<Route>();
    Serializer::with_registry(config.with_default_adapters(true), types)
}

fn sample() -> Result<Value> {
    let at = Utc
        .with_ymd_and_hms(2024, 5, 6, 7, 8, 9)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous timestamp"))?;
    Ok(Value::Array(vec![
        Route(
            Coord { lat: 1.5, lon: -2.25 },
            Coord { lat: 3.0, lon: 4.0 },
        )
        .into_value(),
        at.into_value(),
        NaiveDate::from_ymd_opt(2020, 1, 31)
            .ok_or_else(|| anyhow::anyhow!("invalid date"))?
            .into_value(),
    ]))
}

fn names() -> Vec<String> {
    ["geo.Coord", "geo.Route", "chrono.DateTime", "chrono.NaiveDate"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[test]
fn test_compaction_is_transparent() -> Result<()> {
    let plain = serializer(SerializerConfig::new("plain"));
    let mut compact = serializer(SerializerConfig::new("compact"));
    compact.activate_compaction(Some(names()));

    let value = sample()?;
    let plain_bytes = plain.encode(&value)?;
    let compact_bytes = compact.encode(&value)?;

    assert!(compact_bytes.len() < plain_bytes.len());
    assert_eq!(compact.decode(&compact_bytes)?, plain.decode(&plain_bytes)?);
    assert_eq!(compact.decode(&compact_bytes)?, value);
    Ok(())
}

#[test]
fn test_compaction_from_config() -> Result<()> {
    let compact = serializer(SerializerConfig::new("configured").with_compaction(names()));
    let table = compact.compaction().expect("activated by config");
    assert_eq!(table.code_of("geo.Route"), Some(1));

    let value = sample()?;
    assert_eq!(compact.decode(&compact.encode(&value)?)?, value);
    Ok(())
}

#[test]
fn test_unknown_code_is_not_deserializable() -> Result<()> {
    let mut compact = serializer(SerializerConfig::new("compact"));
    compact.activate_compaction(Some(names()));

    let forged = Envelope::new(ClassTag::Code(99), "", Value::Nil).into_value();
    let bytes = compact.encode(&forged)?;
    let err = compact.decode(&bytes).expect_err("code 99 is not in the table");
    assert!(err.is_not_deserializable());

    let named = Envelope::new(ClassTag::Name("Coord".into()), "geo", Value::Nil).into_value();
    let bytes = compact.encode(&named)?;
    assert!(compact.decode(&bytes).is_err());
    Ok(())
}

#[test]
fn test_name_outside_table_is_not_serializable() {
    let mut compact = serializer(SerializerConfig::new("compact"));
    compact.activate_compaction(Some(vec!["geo.Coord".to_string()]));

    let err = compact
        .encode(&Route(Coord { lat: 0.0, lon: 0.0 }, Coord { lat: 1.0, lon: 1.0 }).into_value())
        .expect_err("geo.Route has no code");
    assert!(err.is_not_serializable());
    assert_eq!(err.type_name(), Some("geo.Route"));
}

#[test]
fn test_reactivation_replaces_the_table() -> Result<()> {
    let mut sender = serializer(SerializerConfig::new("sender"));
    sender.activate_compaction(Some(names()));
    let value = Coord { lat: 9.0, lon: 9.5 }.into_value();
    let bytes = sender.encode(&value)?;

    let mut receiver = serializer(SerializerConfig::new("receiver"));
    receiver.activate_compaction(Some(vec!["geo.Route".into(), "geo.Coord".into()]));
    // Same code, different enumeration: decodes to the wrong type and fails
    assert!(receiver.decode(&bytes).is_err());

    receiver.activate_compaction(Some(names()));
    assert_eq!(receiver.decode(&bytes)?, value);
    assert_eq!(receiver.compaction().map(|t| t.len()), Some(4));
    Ok(())
}

#[test]
fn test_implicit_enumeration_uses_registered_names() -> Result<()> {
    let mut compact = serializer(SerializerConfig::new("implicit"));
    compact.activate_compaction(None);

    let table = compact.compaction().expect("active");
    assert_eq!(table.code_of("chrono.DateTime"), Some(0));
    let registered: Vec<&str> = compact.registered_names().collect();
    assert_eq!(table.names(), registered);

    let at = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid");
    assert_eq!(compact.decode(&compact.encode(&at.into_value())?)?, at.into_value());
    Ok(())
}
