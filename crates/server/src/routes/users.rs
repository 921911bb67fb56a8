use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    Extension, Json,
};
use models::{merge_payload, user};
use serde_json::Value;

use super::records::find;
use crate::errors::ApiError;
use crate::payload::{hash_password, json_object, render, require_str};
use crate::session::Session;

pub async fn create(
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = json_object(&body)?;
    let email = require_str(&payload, "email")?;
    let password = require_str(&payload, "password")?;
    let mut record = merge_payload(&user::Model::new(email, ""), &payload)?;
    record.password = hash_password(password)?;
    Ok((StatusCode::CREATED, Json(render(session.persist(record).await?))))
}

/// Same as the generic update, except a new password is stored hashed.
pub async fn update(
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let stored = find::<user::Model>(&session, &user_id).await?;
    let payload = json_object(&body)?;
    let mut record = merge_payload(&stored, &payload)?;
    if payload.contains_key("password") {
        record.password = hash_password(&record.password)?;
    }
    Ok(Json(render(session.persist(record).await?)))
}

