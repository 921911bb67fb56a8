use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    Extension, Json,
};
use models::{city, merge_payload, state};
use service::Resolver;
use serde_json::Value;

use super::records::find;
use crate::errors::ApiError;
use crate::payload::{json_object, render, render_all, require};
use crate::session::Session;

pub async fn list_by_state(
    Extension(session): Extension<Session>,
    Path(state_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let state = find::<state::Model>(&session, &state_id).await?;
    let cities = Resolver::new(&*session).cities_of_state(&state.id).await?;
    Ok(Json(render_all(cities)))
}

pub async fn create(
    Extension(session): Extension<Session>,
    Path(state_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let state = find::<state::Model>(&session, &state_id).await?;
    let payload = json_object(&body)?;
    require(&payload, "name")?;
    let record = merge_payload(&city::Model::new(state.id, ""), &payload)?;
    Ok((StatusCode::CREATED, Json(render(session.persist(record).await?))))
}
