//! Lenient structured decode for model responses.
//!
//! Generative models wrap JSON in prose or code fences. The contract is deliberately
//! simple: take the span from the first `{` to the last `}` and decode it as an object.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("no JSON object span in response")]
    NoJsonSpan,

    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("decoded JSON is not an object")]
    NotAnObject,

    #[error("missing key `{0}`")]
    MissingKey(String),

    #[error("key `{0}` is not an array")]
    NotAnArray(String),
}

/// The slice between the first `{` and the last `}`, inclusive.
pub fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn decode_object(text: &str) -> Result<Map<String, Value>, DecodeError> {
    let span = json_object_span(text).ok_or(DecodeError::NoJsonSpan)?;
    match serde_json::from_str::<Value>(span)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Decodes the object and returns the array stored under `key`.
pub fn decode_array_field(text: &str, key: &str) -> Result<Vec<Value>, DecodeError> {
    let mut object = decode_object(text)?;
    match object.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DecodeError::NotAnArray(key.to_string())),
        None => Err(DecodeError::MissingKey(key.to_string())),
    }
}
