pub mod amenities;
pub mod cities;
pub mod index;
pub mod place_amenities;
pub mod places;
pub mod records;
pub mod reviews;
pub mod states;
pub mod users;

use axum::{middleware, routing::{get, post}, Router};
use models::{amenity, city, place, review, state, user};
use service::StorageEngine;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::errors::ApiError;
use crate::session::storage_session;

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Full application router, everything under `/api/v1`.
pub fn build_router(engine: StorageEngine, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        .route("/states", get(records::list::<state::Model>).post(states::create))
        .route(
            "/states/:state_id",
            get(records::show::<state::Model>)
                .put(records::update::<state::Model>)
                .delete(records::destroy::<state::Model>),
        )
        .route("/states/:state_id/cities", get(cities::list_by_state).post(cities::create))
        .route(
            "/cities/:city_id",
            get(records::show::<city::Model>)
                .put(records::update::<city::Model>)
                .delete(records::destroy::<city::Model>),
        )
        .route("/amenities", get(records::list::<amenity::Model>).post(amenities::create))
        .route(
            "/amenities/:amenity_id",
            get(records::show::<amenity::Model>)
                .put(records::update::<amenity::Model>)
                .delete(records::destroy::<amenity::Model>),
        )
        .route("/users", get(records::list::<user::Model>).post(users::create))
        .route(
            "/users/:user_id",
            get(records::show::<user::Model>)
                .put(users::update)
                .delete(records::destroy::<user::Model>),
        )
        .route("/cities/:city_id/places", get(places::list_by_city).post(places::create))
        .route(
            "/places/:place_id",
            get(records::show::<place::Model>)
                .put(records::update::<place::Model>)
                .delete(records::destroy::<place::Model>),
        )
        .route("/places_search", post(places::search))
        .route("/places/:place_id/reviews", get(reviews::list_by_place).post(reviews::create))
        .route(
            "/reviews/:review_id",
            get(records::show::<review::Model>)
                .put(records::update::<review::Model>)
                .delete(records::destroy::<review::Model>),
        )
        .route("/places/:place_id/amenities", get(place_amenities::list))
        .route(
            "/places/:place_id/amenities/:amenity_id",
            post(place_amenities::link).delete(place_amenities::unlink),
        )
        .route_layer(middleware::from_fn_with_state(engine, storage_session));

    Router::new()
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
