//! Shared Serde deserializers
//!
//! Adapters report scalar payloads in whatever JSON type the protocol
//! produced. Readings keep them as text:
//! - `"12.5"` → `"12.5"`
//! - `12.5` → `"12.5"`
//! - `true` → `"true"`
//! - `null` → `""`

use serde::{Deserialize, Deserializer};

/// Custom deserializer for scalar reading payloads
pub fn deserialize_scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        String(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Null,
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::String(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Null => String::new(),
    })
}
