use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tagpack::{
    pack_fn, positional, unpack_fn, Exportable, Fields, FromValue, Importable, IntoValue,
    Serializer, SerializerConfig, TypeTable, Typed, Value,
};

/// Registered explicitly, no structural capability
#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "pkg")]
struct Point {
    x: i64,
    y: i64,
}

/// Dataclass-like: rebuilt from its attribute map
#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "shapes", structural)]
struct Vertex {
    x: i64,
    y: i64,
}

#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "shapes", structural)]
struct Segment {
    start: Vertex,
    end: Vertex,
    label: Option<String>,
}

/// Named-tuple-like: rebuilt positionally
#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "shapes", structural)]
struct Pair(i64, String);

/// Fixed slots, rebuilt from `Default`
#[derive(Clone, Debug, PartialEq, Default, Typed)]
#[tagpack(module = "shapes", slots)]
struct Slotted {
    attr: i64,
    note: String,
}

/// Self-describing: packs and unpacks its own payload
#[derive(Clone, Debug, PartialEq, Typed)]
#[tagpack(module = "custom", export, import)]
struct CustomClass {
    attr1: String,
    attr2: String,
}

impl Exportable for CustomClass {
    fn export(&self) -> Result<Value> {
        let fields: Fields = [("attr1", self.attr1.clone()), ("attr2", self.attr2.clone())]
            .into_iter()
            .collect();
        Ok(fields.into_value())
    }
}

impl Importable for CustomClass {
    fn import(payload: Value) -> Result<Self> {
        let mut fields = Fields::from_map(payload)?;
        Ok(Self {
            attr1: fields.take_as("attr1")?,
            attr2: fields.take_as("attr2")?,
        })
    }
}

fn shapes_serializer() -> Serializer {
    let types = Arc::new(TypeTable::new());
    types.register_type::<Vertex>();
    types.register_type::<Segment>();
    types.register_type::<Pair>();
    types.register_type::<Slotted>();
    types.register_type::<CustomClass>();
    Serializer::with_registry(SerializerConfig::new("round-trip"), types)
}

fn round_trip(serializer: &Serializer, value: Value) -> Result<()> {
    let bytes = serializer.encode(&value)?;
    assert_eq!(serializer.decode(&bytes)?, value);
    Ok(())
}

#[test]
fn test_registered_point_scenario() -> Result<()> {
    let mut serializer = Serializer::with_registry(
        SerializerConfig::new("points"),
        Arc::new(TypeTable::new()),
    );
    serializer.register(
        "pkg.Point",
        Some(pack_fn(|object| {
            let point = object
                .downcast_ref::<Point>()
                .ok_or_else(|| anyhow!("not a point"))?;
            Ok(Some(Value::Array(vec![point.x.into(), point.y.into()])))
        })),
        Some(unpack_fn(|payload| {
            let [x, y] = positional::<2>(Vec::<Value>::from_value(payload)?)?;
            Ok(Point {
                x: i64::from_value(x)?,
                y: i64::from_value(y)?,
            }
            .into_value())
        })),
    );

    let bytes = serializer.encode(&Point { x: 1, y: 2 }.into_value())?;
    let decoded: Point = serializer.decode_as(&bytes)?;
    assert_eq!(decoded, Point { x: 1, y: 2 });
    Ok(())
}

#[test]
fn test_dataclass_like_round_trip() -> Result<()> {
    let serializer = shapes_serializer();
    let vertex = Vertex { x: 123, y: -7 };

    let bytes = serializer.encode(&vertex.clone().into_value())?;
    let decoded: Vertex = serializer.decode_as(&bytes)?;
    assert_eq!(decoded, vertex);
    Ok(())
}

#[test]
fn test_nested_objects_round_trip() -> Result<()> {
    let serializer = shapes_serializer();
    let segment = Segment {
        start: Vertex { x: 0, y: 0 },
        end: Vertex { x: 3, y: 4 },
        label: Some("diagonal".into()),
    };
    round_trip(&serializer, segment.clone().into_value())?;

    let mut by_name = BTreeMap::new();
    by_name.insert("first".to_string(), segment.clone());
    by_name.insert(
        "second".to_string(),
        Segment {
            label: None,
            ..segment
        },
    );
    let value = Value::Array(vec![by_name.into_value(), Pair(1, "one".into()).into_value()]);
    round_trip(&serializer, value)
}

#[test]
fn test_named_tuple_like_round_trip() -> Result<()> {
    let serializer = shapes_serializer();
    let pair = Pair(456, "def".into());

    let bytes = serializer.encode(&pair.clone().into_value())?;
    let decoded: Pair = serializer.decode_as(&bytes)?;
    assert_eq!(decoded, pair);
    Ok(())
}

#[test]
fn test_slotted_round_trip() -> Result<()> {
    let serializer = shapes_serializer();
    let slotted = Slotted {
        attr: 123,
        note: "kept".into(),
    };

    let bytes = serializer.encode(&slotted.clone().into_value())?;
    let decoded: Slotted = serializer.decode_as(&bytes)?;
    assert_eq!(decoded, slotted);
    Ok(())
}

#[test]
fn test_slotted_decode_keeps_defaults_for_absent_slots() -> Result<()> {
    let serializer = shapes_serializer();
    let envelope = tagpack::Envelope::new(
        tagpack::ClassTag::Name("Slotted".into()),
        "shapes",
        Value::map([("attr", 5)]),
    );
    let bytes = serializer.encode(&envelope.into_value())?;

    let decoded: Slotted = serializer.decode_as(&bytes)?;
    assert_eq!(
        decoded,
        Slotted {
            attr: 5,
            note: String::new()
        }
    );
    Ok(())
}

#[test]
fn test_self_describing_round_trip() -> Result<()> {
    let serializer = shapes_serializer();
    let custom = CustomClass {
        attr1: "test1".into(),
        attr2: "test2".into(),
    };

    let bytes = serializer.encode(&custom.clone().into_value())?;
    let decoded: CustomClass = serializer.decode_as(&bytes)?;
    assert_eq!(decoded, custom);
    Ok(())
}

#[test]
fn test_missing_attribute_is_not_deserializable() -> Result<()> {
    let serializer = shapes_serializer();
    let envelope = tagpack::Envelope::new(
        tagpack::ClassTag::Name("Vertex".into()),
        "shapes",
        Value::map([("x", 1)]),
    );
    let bytes = serializer.encode(&envelope.into_value())?;

    let err = serializer.decode(&bytes).expect_err("y is missing");
    assert!(err.is_not_deserializable());
    assert!(err.to_string().contains("missing field y"));
    Ok(())
}
