//! WAL and checkpoint record definitions
//!
//! Defines the structure of individual log lines. Field names are part of the
//! on-disk format.

use serde::{Deserialize, Serialize};

/// Mutations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Insert or overwrite a key
    Put,

    /// Overwrite a key only if it exists
    Update,

    /// Remove a key
    Delete,
}

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalRecord {
    pub operation: Operation,

    pub key: String,

    /// Absent for DELETE. A PUT/UPDATE without a value means an empty value.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_value")]
    pub value: Option<Vec<u8>>,
}

impl WalRecord {
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            operation: Operation::Put,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn update(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            operation: Operation::Update,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            operation: Operation::Delete,
            key: key.into(),
            value: None,
        }
    }
}

/// A single live entry in a checkpoint file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_value")]
    pub value: Option<Vec<u8>>,
}

impl CheckpointRecord {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// Byte values travel as standard base64 strings
mod base64_value {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
