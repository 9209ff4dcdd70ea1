use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tagpack::{Serializer, SerializerConfig, TypeTable, Value, CLASS_KEY, DATA_KEY, MODULE_KEY};

fn serializer() -> Serializer {
    Serializer::with_registry(
        SerializerConfig::new("passthrough").with_default_adapters(true),
        Arc::new(TypeTable::new()),
    )
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        ((i64::MAX as u64 + 1)..=u64::MAX).prop_map(Value::UInt),
        (-1.0e12f64..1.0e12).prop_map(Value::Float),
        "[a-zA-Z0-9 .#]{0,12}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        (any::<i8>(), prop::collection::vec(any::<u8>(), 1..8))
            .prop_map(|(tag, data)| Value::Ext(tag, data)),
    ]
}

/// Native trees; map keys never cover all three reserved keys
fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,6}".prop_map(Value::Str), inner), 0..6)
                .prop_map(Value::Map),
        ]
    })
}

proptest! {
    #[test]
    fn native_values_pass_through(value in tree()) {
        let serializer = serializer();
        let bytes = serializer.encode(&value).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let strict = serializer.encode_strict(&value).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&bytes, &strict);

        let decoded = serializer.decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decoded, value);
    }
}

#[test]
fn test_maps_with_other_key_sets_pass_through() -> anyhow::Result<()> {
    let serializer = serializer();
    let near_misses = vec![
        Value::map([(CLASS_KEY, "A"), (MODULE_KEY, "m")]),
        Value::map([(CLASS_KEY, "A"), (MODULE_KEY, "m"), (DATA_KEY, "x"), ("extra", "y")]),
        Value::map([(CLASS_KEY, "A"), (MODULE_KEY, "m"), ("data", "x")]),
        Value::Map(vec![
            (Value::from(1), Value::from("A")),
            (Value::from(MODULE_KEY), Value::from("m")),
            (Value::from(DATA_KEY), Value::Nil),
        ]),
    ];

    for value in near_misses {
        assert_eq!(serializer.decode(&serializer.encode(&value)?)?, value);
    }
    Ok(())
}

#[test]
fn test_envelope_shaped_data_is_read_as_an_envelope() -> anyhow::Result<()> {
    let serializer = serializer();
    let collision = Value::map([(CLASS_KEY, "Thing"), (MODULE_KEY, "app"), (DATA_KEY, "payload")]);

    let err = serializer
        .decode(&serializer.encode(&collision)?)
        .expect_err("no escaping for reserved keys");
    assert!(err.is_not_deserializable());
    assert_eq!(err.type_name(), Some("app.Thing"));
    Ok(())
}
