//! Handlers shared by every resource, generic over the record type.

use axum::{body::Bytes, extract::Path, Extension, Json};
use models::{merge_payload, Record};
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::payload::{json_object, render, render_all};
use crate::session::Session;

pub async fn find<T: Record>(session: &Session, id: &str) -> Result<T, ApiError> {
    session.get_as::<T>(id).await?.ok_or(ApiError::NotFound)
}

pub async fn list<T: Record>(Extension(session): Extension<Session>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(render_all(session.all_of::<T>().await?)))
}

pub async fn show<T: Record>(
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(render(find::<T>(&session, &id).await?)))
}

pub async fn destroy<T: Record>(
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = find::<T>(&session, &id).await?;
    session.delete(&record.into_object()).await?;
    session.save().await?;
    Ok(Json(json!({})))
}

/// Overlay the body onto the stored record; protected keys are left alone.
pub async fn update<T: Record>(
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let record = find::<T>(&session, &id).await?;
    let payload = json_object(&body)?;
    let merged = merge_payload(&record, &payload)?;
    Ok(Json(render(session.persist(merged).await?)))
}
