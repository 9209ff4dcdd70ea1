use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tagpack::{ClassTag, Envelope, IntoValue, Serializer, SerializerConfig, TypeTable, Value};

fn serializer() -> Serializer {
    Serializer::with_registry(
        SerializerConfig::new("datetime").with_default_adapters(true),
        Arc::new(TypeTable::new()),
    )
}

fn sample_instant() -> Result<DateTime<Utc>> {
    let base = Utc
        .with_ymd_and_hms(2023, 11, 14, 22, 13, 20)
        .single()
        .context("valid timestamp")?;
    Ok(base + chrono::Duration::microseconds(654_321))
}

#[test]
fn test_datetime_round_trip_in_both_modes() -> Result<()> {
    let serializer = serializer();
    let instant = sample_instant()?;

    for strict in [true, false] {
        let bytes = serializer.encode_with(&instant.into_value(), strict)?;
        let decoded = serializer.decode_with(&bytes, strict)?;
        assert_eq!(decoded, instant.into_value());
    }
    Ok(())
}

#[test]
fn test_sub_microsecond_instants_round_trip_exactly() -> Result<()> {
    let serializer = serializer();
    let base = Utc
        .with_ymd_and_hms(2023, 1, 2, 3, 4, 5)
        .single()
        .context("valid timestamp")?;
    let precise = base + chrono::Duration::nanoseconds(123_456_789);

    for instant in [precise, Utc::now()] {
        let decoded: DateTime<Utc> = serializer.decode_as(&serializer.encode(&instant.into_value())?)?;
        assert_eq!(decoded, instant);
    }

    let naive = precise.naive_utc();
    let decoded: NaiveDateTime = serializer.decode_as(&serializer.encode(&naive.into_value())?)?;
    assert_eq!(decoded, naive);
    Ok(())
}

#[test]
fn test_naive_types_round_trip() -> Result<()> {
    let serializer = serializer();
    let date = NaiveDate::from_ymd_opt(1999, 12, 31).context("valid date")?;
    let naive: NaiveDateTime = date.and_hms_micro_opt(23, 59, 59, 999_999).context("valid time")?;
    let value = Value::map([("date", date.into_value()), ("naive", naive.into_value())]);

    let decoded = serializer.decode_strict(&serializer.encode_strict(&value)?)?;
    assert_eq!(decoded.get("date"), Some(&date.into_value()));
    assert_eq!(decoded, value);
    Ok(())
}

#[test]
fn test_encoded_timestamps_sort_like_values() -> Result<()> {
    let serializer = serializer();
    let early = sample_instant()?;
    let late = early + chrono::Duration::days(400);

    let payload = |instant: DateTime<Utc>| -> Result<String> {
        let bytes = serializer.encode(&instant.into_value())?;
        let wire = rmpv::decode::read_value(&mut bytes.as_slice())?;
        let text = wire
            .as_map()
            .and_then(|entries| entries.iter().find(|(k, _)| k.as_str() == Some("d")))
            .and_then(|(_, v)| v.as_str())
            .context("payload text")?;
        Ok(text.to_string())
    };

    let (a, b) = (payload(early)?, payload(late)?);
    assert_eq!(a, "2023-11-14T22:13:20.654321000Z");
    assert!(a < b);
    Ok(())
}

#[test]
fn test_bad_datetime_payload_is_not_deserializable() -> Result<()> {
    let serializer = serializer();
    for payload in [Value::Nil, Value::from("yesterday"), Value::from(1_700_000_000)] {
        let forged = Envelope::new(ClassTag::Name("DateTime".into()), "chrono", payload);
        let bytes = serializer.encode(&forged.into_value())?;

        let err = serializer.decode(&bytes).expect_err("payload is not a timestamp");
        assert!(err.is_not_deserializable());
        assert_eq!(err.type_name(), Some("chrono.DateTime"));
    }
    Ok(())
}
