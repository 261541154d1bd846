//! JSON payloads carried as zenoh-ext serialized strings

use serde::de::DeserializeOwned;
use serde::Serialize;
use zenoh::bytes::ZBytes;

use crate::error::{ArenaError, Result};

/// Serialize a protocol value into a zenoh payload
pub fn encode<T: Serialize>(value: &T) -> Result<ZBytes> {
    let json = serde_json::to_string(value)?;
    Ok(zenoh_ext::z_serialize(&json))
}

/// Deserialize a protocol value from a zenoh payload
pub fn decode<T: DeserializeOwned>(payload: &ZBytes) -> Result<T> {
    let json: String = zenoh_ext::z_deserialize(payload)
        .map_err(|e| ArenaError::Serialization(format!("Failed to deserialize: {}", e)))?;
    Ok(serde_json::from_str(&json)?)
}
