//! Credential values.
//!
//! [`Secret`] has two faces. Every text rendering (`Display`, `Debug`, and so
//! every log line and error message built from them) prints `<redacted>`.
//! Serialization writes the raw value, because the peer needs the real
//! credential. The two paths share no code.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;

const REDACTED: &str = "<redacted>";

/// A credential such as an API key or access token.
pub struct Secret(SecretString);

impl Secret {
    /// Wrap a raw credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into()))
    }

    /// The raw credential. Callers own the consequences of printing it.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.expose()
            .as_bytes()
            .ct_eq(other.expose().as_bytes())
            .into()
    }
}

impl Eq for Secret {}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&REDACTED).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_forms_are_redacted() {
        let secret = Secret::new("sk-live-123");
        assert_eq!(secret.to_string(), "<redacted>");
        assert_eq!(format!("{secret:?}"), r#"Secret("<redacted>")"#);
        assert_eq!(format!("{secret:#?}").contains("sk-live"), false);
    }

    #[test]
    fn test_wire_form_is_raw() {
        let secret = Secret::new("sk-live-123");
        assert_eq!(serde_json::to_string(&secret).unwrap(), r#""sk-live-123""#);
        let back: Secret = serde_json::from_str(r#""sk-live-123""#).unwrap();
        assert_eq!(back, secret);
        assert_eq!(back.expose(), "sk-live-123");
    }

    #[test]
    fn test_clone_and_compare() {
        let secret = Secret::from("a");
        assert_eq!(secret.clone(), secret);
        assert_ne!(Secret::from("a"), Secret::from("b"));
        assert!(Secret::from("").is_empty());
    }
}
