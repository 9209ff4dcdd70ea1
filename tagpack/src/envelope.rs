//! The typed envelope: `{CLASS_KEY: class, MODULE_KEY: module, DATA_KEY: payload}`.
//!
//! The exact three-key shape is the only discriminator. An application map
//! that happens to use exactly these keys will be read back as an envelope;
//! there is no escaping convention.

use crate::value::Value;

pub const CLASS_KEY: &str = ".";
pub const MODULE_KEY: &str = "#";
pub const DATA_KEY: &str = "d";

/// Class tag as written on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassTag {
    /// Plain type name; the module travels in the module tag
    Name(String),
    /// Compaction code; the module tag is empty
    Code(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub class_tag: Value,
    pub module_tag: Value,
    pub payload: Value,
}

impl Envelope {
    pub fn new(class_tag: ClassTag, module: &str, payload: Value) -> Self {
        let class_tag = match class_tag {
            ClassTag::Name(name) => Value::Str(name),
            ClassTag::Code(code) => Value::from(code),
        };
        Self {
            class_tag,
            module_tag: Value::Str(module.to_string()),
            payload,
        }
    }

    /// Recognize a decoded map, handing it back untouched when it is not an envelope.
    pub fn recognize(entries: Vec<(Value, Value)>) -> Result<Self, Vec<(Value, Value)>> {
        if !is_envelope(&entries) {
            return Err(entries);
        }
        let mut class_tag = Value::Nil;
        let mut module_tag = Value::Nil;
        let mut payload = Value::Nil;
        for (key, value) in entries {
            match key.as_str() {
                Some(CLASS_KEY) => class_tag = value,
                Some(MODULE_KEY) => module_tag = value,
                _ => payload = value,
            }
        }
        Ok(Self {
            class_tag,
            module_tag,
            payload,
        })
    }

    /// Class tag as a compaction code, if it is a non-negative integer
    pub fn class_code(&self) -> Option<u32> {
        self.class_tag
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
    }

    /// Human-readable `module.class` for error messages, whatever the tags hold
    pub fn describe(&self) -> String {
        let part = |v: &Value| match v {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        };
        format!("{}.{}", part(&self.module_tag), part(&self.class_tag))
    }

    pub fn into_value(self) -> Value {
        Value::Map(vec![
            (Value::Str(CLASS_KEY.to_string()), self.class_tag),
            (Value::Str(MODULE_KEY.to_string()), self.module_tag),
            (Value::Str(DATA_KEY.to_string()), self.payload),
        ])
    }
}

/// Exactly three string keys forming the reserved key set
pub fn is_envelope(entries: &[(Value, Value)]) -> bool {
    if entries.len() != 3 {
        return false;
    }
    let has = |name: &str| entries.iter().any(|(k, _)| k.as_str() == Some(name));
    has(CLASS_KEY) && has(MODULE_KEY) && has(DATA_KEY)
}
