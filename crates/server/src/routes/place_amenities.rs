use axum::{extract::Path, http::StatusCode, Extension, Json};
use models::{amenity, place};
use serde_json::{json, Value};
use service::Resolver;

use super::records::find;
use crate::errors::ApiError;
use crate::payload::{render, render_all};
use crate::session::Session;

pub async fn list(
    Extension(session): Extension<Session>,
    Path(place_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let place = find::<place::Model>(&session, &place_id).await?;
    let amenities = Resolver::new(&*session).amenities_of_place(&place).await?;
    Ok(Json(render_all(amenities)))
}

/// 201 for a new link, 200 when the amenity was already linked.
pub async fn link(
    Extension(session): Extension<Session>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let place = find::<place::Model>(&session, &place_id).await?;
    let amenity = find::<amenity::Model>(&session, &amenity_id).await?;
    if !Resolver::new(&*session).link_amenity(&place, &amenity.id).await? {
        return Ok((StatusCode::OK, Json(render(amenity))));
    }
    session.save().await?;
    Ok((StatusCode::CREATED, Json(render(amenity))))
}

pub async fn unlink(
    Extension(session): Extension<Session>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let place = find::<place::Model>(&session, &place_id).await?;
    let amenity = find::<amenity::Model>(&session, &amenity_id).await?;
    if !Resolver::new(&*session).unlink_amenity(&place, &amenity.id).await? {
        return Err(ApiError::NotFound);
    }
    session.save().await?;
    Ok(Json(json!({})))
}
