use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest};
use anyhow::Context;
use futures::StreamExt;
use serde_json::{map::Entry, Map, Value};

use super::ContactError;

pub const MAX_FIELD_LENGTH: usize = 1000;
pub const MAX_MESSAGE_LENGTH: usize = 5000;
/// Hard ceiling for the raw request body, in bytes.
pub const MAX_BODY_SIZE: usize = MAX_MESSAGE_LENGTH * 4;

/// Reads the body chunk by chunk, bailing out as soon as it grows past `limit`.
pub async fn read_body(
    mut payload: web::Payload,
    limit: usize,
) -> Result<web::BytesMut, ContactError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.context("Failed to read the request body")?;
        // Limit is checked before the chunk is copied, the body never grows
        // past `limit` in memory even when the client lies about Content-Length
        if body.len() + chunk.len() > limit {
            return Err(ContactError::PayloadTooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub fn content_type(request: &HttpRequest) -> &str {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Decodes a JSON or URL-encoded body.
///
/// Anything that cannot be decoded, including unknown content types, turns
/// into an empty object rather than an error.
pub fn parse_payload(raw: &[u8], content_type: &str) -> Value {
    if raw.is_empty() {
        return Value::Object(Map::new());
    }
    if content_type.contains("application/json") {
        serde_json::from_slice(raw).unwrap_or_else(|_| Value::Object(Map::new()))
    } else if content_type.contains("application/x-www-form-urlencoded") {
        parse_form(raw)
    } else {
        Value::Object(Map::new())
    }
}

/// Repeated keys are collected into an array, in submission order.
fn parse_form(raw: &[u8]) -> Value {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw).unwrap_or_default();

    let mut form = Map::new();
    for (key, value) in pairs {
        match form.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(Value::String(value));
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(values) => values.push(Value::String(value)),
                first => *first = Value::Array(vec![first.take(), Value::String(value)]),
            },
        }
    }
    Value::Object(form)
}
