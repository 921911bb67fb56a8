use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    Extension, Json,
};
use models::{merge_payload, place, review, user};
use serde_json::Value;
use service::Resolver;

use super::records::find;
use crate::errors::ApiError;
use crate::payload::{json_object, render, render_all, require, require_str};
use crate::session::Session;

pub async fn list_by_place(
    Extension(session): Extension<Session>,
    Path(place_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let place = find::<place::Model>(&session, &place_id).await?;
    let reviews = Resolver::new(&*session).reviews_of_place(&place.id).await?;
    Ok(Json(render_all(reviews)))
}

pub async fn create(
    Extension(session): Extension<Session>,
    Path(place_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let place = find::<place::Model>(&session, &place_id).await?;
    let payload = json_object(&body)?;
    let user = find::<user::Model>(&session, require_str(&payload, "user_id")?).await?;
    require(&payload, "text")?;
    let record = merge_payload(&review::Model::new(place.id, user.id, ""), &payload)?;
    Ok((StatusCode::CREATED, Json(render(session.persist(record).await?))))
}
