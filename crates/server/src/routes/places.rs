use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    Extension, Json,
};
use models::{city, merge_payload, place, user};
use serde_json::Value;
use service::{PlaceSearch, Resolver};

use super::records::find;
use crate::errors::ApiError;
use crate::payload::{json_object, render, render_all, require, require_str};
use crate::session::Session;

pub async fn list_by_city(
    Extension(session): Extension<Session>,
    Path(city_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let city = find::<city::Model>(&session, &city_id).await?;
    let places = Resolver::new(&*session).places_of_city(&city.id).await?;
    Ok(Json(render_all(places)))
}

/// City, then body, then owning user, then name.
pub async fn create(
    Extension(session): Extension<Session>,
    Path(city_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let city = find::<city::Model>(&session, &city_id).await?;
    let payload = json_object(&body)?;
    let user = find::<user::Model>(&session, require_str(&payload, "user_id")?).await?;
    require(&payload, "name")?;
    let record = merge_payload(&place::Model::new(city.id, user.id, ""), &payload)?;
    Ok((StatusCode::CREATED, Json(render(session.persist(record).await?))))
}

pub async fn search(Extension(session): Extension<Session>, body: Bytes) -> Result<Json<Vec<Value>>, ApiError> {
    let payload = json_object(&body)?;
    let query: PlaceSearch = serde_json::from_value(Value::Object(payload))
        .map_err(|e| ApiError::BadRequest(format!("invalid search: {e}")))?;
    let places = Resolver::new(&*session).search_places(&query).await?;
    Ok(Json(render_all(places)))
}
