//! MessagePack plumbing shared by the bundle and message codecs.

use crate::{ProtoError, Result};
use rmpv::Value;

/// Encodes a value map into its binary form.
pub(crate) fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value)
        .map_err(|err| ProtoError::MalformedMessage(format!("unencodable value: {err}")))?;
    Ok(buf)
}

/// Decodes a single value from its binary form.
pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Value> {
    let mut cursor = bytes;
    rmpv::decode::read_value(&mut cursor)
        .map_err(|err| ProtoError::MalformedMessage(format!("undecodable value: {err}")))
}

/// Looks up a string-keyed entry in a decoded map.
pub(crate) fn get<'a>(map: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(key, _)| key.as_str() == Some(name))
        .map(|(_, value)| value)
}

/// Looks up a string field.
pub(crate) fn get_str<'a>(map: &'a [(Value, Value)], name: &str) -> Option<&'a str> {
    get(map, name).and_then(Value::as_str)
}

/// Looks up an unsigned integer field.
pub(crate) fn get_u64(map: &[(Value, Value)], name: &str) -> Option<u64> {
    get(map, name).and_then(Value::as_u64)
}

/// Looks up a boolean field.
pub(crate) fn get_bool(map: &[(Value, Value)], name: &str) -> Option<bool> {
    get(map, name).and_then(Value::as_bool)
}
