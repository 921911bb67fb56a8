//! Request bodies in, response bodies out.

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use models::Record;
use rand::rngs::OsRng;
use serde_json::{Map, Value};

use crate::errors::ApiError;

/// The body must be a JSON object.
pub fn json_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::not_a_json()),
    }
}

/// A present, non-null field.
pub fn require<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ApiError> {
    match body.get(field) {
        Some(Value::Null) | None => Err(ApiError::missing(field)),
        Some(v) => Ok(v),
    }
}

pub fn require_str<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a str, ApiError> {
    require(body, field)?.as_str().ok_or_else(|| ApiError::missing(field))
}

/// Client view of a record: tagged with `__class__`, never carrying a password.
pub fn render<T: Record>(record: T) -> Value {
    let mut value = serde_json::to_value(record.into_object()).unwrap_or(Value::Null);
    if let Some(fields) = value.as_object_mut() {
        fields.remove("password");
    }
    value
}

pub fn render_all<T: Record>(records: impl IntoIterator<Item = T>) -> Vec<Value> {
    records.into_iter().map(render).collect()
}

pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}
