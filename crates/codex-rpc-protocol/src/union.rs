//! Forward-compatible discriminated unions.
//!
//! Payloads such as thread items and accounts are tagged objects whose set of
//! tags grows with the server. Known tags decode into typed variants; anything
//! else lands in an `Unknown` variant holding a [`RawVariant`], which writes
//! back the exact bytes it was read from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

/// An undecoded union member, kept byte for byte.
#[derive(Clone)]
pub struct RawVariant {
    raw: Box<RawValue>,
}

impl RawVariant {
    /// Wrap already-encoded JSON.
    pub fn new(raw: Box<RawValue>) -> Self {
        Self { raw }
    }

    /// Encode a value and keep the result.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        RawValue::from_string(serde_json::to_string(value)?).map(Self::new)
    }

    /// The original JSON text.
    pub fn get(&self) -> &str {
        self.raw.get()
    }

    /// Decode the text into a [`Value`] for inspection.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(self.raw.get())
    }

    /// The string member named `field`, when the variant is an object carrying one.
    pub fn tag(&self, field: &str) -> Option<String> {
        let value = self.to_value().ok()?;
        value.get(field)?.as_str().map(str::to_string)
    }
}

impl PartialEq for RawVariant {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl fmt::Debug for RawVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawVariant").field(&self.raw.get()).finish()
    }
}

impl Serialize for RawVariant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawVariant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Box::<RawValue>::deserialize(deserializer).map(Self::new)
    }
}

/// Read the discriminator out of encoded text without decoding the rest.
pub(crate) fn peek_tag(raw: &RawValue, field: &str) -> Result<Option<String>, serde_json::Error> {
    let object: Map<String, Value> = match serde_json::from_str(raw.get()) {
        Ok(object) => object,
        Err(_) => return Ok(None),
    };
    Ok(object.get(field).and_then(Value::as_str).map(str::to_string))
}

/// Serialize `inner` as an object with `field: tag` placed first.
pub(crate) fn serialize_tagged<S, T>(
    serializer: S,
    field: &str,
    tag: &str,
    inner: &T,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    use serde::ser::Error as _;

    let body = serde_json::to_value(inner).map_err(S::Error::custom)?;
    let mut object = Map::new();
    object.insert(field.to_string(), Value::String(tag.to_string()));
    match body {
        Value::Object(fields) => {
            for (key, value) in fields {
                if key != field {
                    object.insert(key, value);
                }
            }
        }
        Value::Null => {}
        other => {
            return Err(S::Error::custom(format!(
                "tagged variant `{tag}` must encode as an object, got {other}"
            )));
        }
    }
    object.serialize(serializer)
}

/// Implement `Serialize`/`Deserialize` for an internally tagged union with an
/// `Unknown(RawVariant)` fallback. Every known variant wraps one struct.
macro_rules! tagged_union {
    ($name:ident, tag = $field:literal, { $($wire:literal => $variant:ident($ty:ty)),+ $(,)? }) => {
        impl $name {
            /// The wire tag of this variant, if it is one of the known ones.
            pub fn known_tag(&self) -> Option<&'static str> {
                match self {
                    $(Self::$variant(_) => Some($wire),)+
                    Self::Unknown(_) => None,
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::union::serialize_tagged(serializer, $field, $wire, inner)
                    })+
                    Self::Unknown(raw) => raw.serialize(serializer),
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                use ::serde::de::Error as _;

                let raw = Box::<::serde_json::value::RawValue>::deserialize(deserializer)?;
                let tag = $crate::union::peek_tag(&raw, $field).map_err(D::Error::custom)?;
                match tag.as_deref() {
                    $(Some($wire) => ::serde_json::from_str(raw.get())
                        .map(Self::$variant)
                        .map_err(D::Error::custom),)+
                    _ => Ok(Self::Unknown($crate::union::RawVariant::new(raw))),
                }
            }
        }
    };
}

pub(crate) use tagged_union;

/// Implement `Serialize`/`Deserialize` for a decision enum whose known members
/// are bare strings, with an `Unknown(RawVariant)` fallback.
macro_rules! string_union {
    ($name:ident, { $($wire:literal => $variant:ident),+ $(,)? }) => {
        impl $name {
            /// The wire string of this variant, if it is one of the known ones.
            pub fn as_str(&self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($wire),)+
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }

            pub(crate) fn from_known(text: &str) -> Option<Self> {
                match text {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use string_union;
