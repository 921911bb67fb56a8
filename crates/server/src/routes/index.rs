use axum::{Extension, Json};
use common::types::{Stats, Status};
use models::ObjectKind;

use crate::errors::ApiError;
use crate::session::Session;

pub async fn status() -> Json<Status> {
    Json(Status::ok())
}

pub async fn stats(Extension(session): Extension<Session>) -> Result<Json<Stats>, ApiError> {
    Ok(Json(Stats {
        amenities: session.count(Some(ObjectKind::Amenity)).await?,
        cities: session.count(Some(ObjectKind::City)).await?,
        places: session.count(Some(ObjectKind::Place)).await?,
        reviews: session.count(Some(ObjectKind::Review)).await?,
        states: session.count(Some(ObjectKind::State)).await?,
        users: session.count(Some(ObjectKind::User)).await?,
    }))
}
