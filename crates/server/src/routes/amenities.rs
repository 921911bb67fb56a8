use axum::{body::Bytes, http::StatusCode, Extension, Json};
use models::{amenity, merge_payload};
use serde_json::Value;

use crate::errors::ApiError;
use crate::payload::{json_object, render, require};
use crate::session::Session;

pub async fn create(
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = json_object(&body)?;
    require(&payload, "name")?;
    let record = merge_payload(&amenity::Model::new(""), &payload)?;
    Ok((StatusCode::CREATED, Json(render(session.persist(record).await?))))
}
