use anyhow::Result;
use configs::DatabaseConfig;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set};

use crate::db::connect_and_migrate;
use crate::{amenity, city, place, place_amenity, review, state, user};

async fn setup_test_db() -> Result<DatabaseConnection> {
    Ok(connect_and_migrate(&DatabaseConfig::sqlite_memory()).await?)
}

#[tokio::test]
async fn test_state_city_crud() -> Result<()> {
    let db = setup_test_db().await?;

    let s = state::Model::new("California");
    s.to_active_model().insert(&db).await?;
    let c = city::Model::new(&s.id, "San Francisco");
    c.to_active_model().insert(&db).await?;

    let found = state::Entity::find_by_id(s.id.clone()).one(&db).await?.unwrap();
    assert_eq!(found, s);

    let cities = city::Entity::find().filter(city::Column::StateId.eq(s.id.clone())).all(&db).await?;
    assert_eq!(cities, vec![c.clone()]);

    // Update keeps identity and creation time
    let mut am = c.to_active_model();
    am.name = Set("Oakland".into());
    let updated = am.update(&db).await?;
    assert_eq!(updated.id, c.id);
    assert_eq!(updated.created_at, c.created_at);
    assert_eq!(updated.name, "Oakland");

    // No cascade from state to city
    state::Entity::delete_by_id(s.id.clone()).exec(&db).await?;
    assert!(state::Entity::find_by_id(s.id.clone()).one(&db).await?.is_none());
    assert!(city::Entity::find_by_id(c.id.clone()).one(&db).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_place_amenity_join() -> Result<()> {
    let db = setup_test_db().await?;

    let u = user::Model::new("betty@example.com", "hash");
    u.to_active_model().insert(&db).await?;
    let p = place::Model::new("city-1", &u.id, "Loft");
    p.to_active_model().insert(&db).await?;
    let wifi = amenity::Model::new("Wifi");
    let pool = amenity::Model::new("Pool");
    wifi.to_active_model().insert(&db).await?;
    pool.to_active_model().insert(&db).await?;

    place_amenity::ActiveModel { place_id: Set(p.id.clone()), amenity_id: Set(wifi.id.clone()) }
        .insert(&db)
        .await?;

    let linked = p.find_related(amenity::Entity).all(&db).await?;
    assert_eq!(linked, vec![wifi.clone()]);

    let places = wifi.find_related(place::Entity).all(&db).await?;
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].id, p.id);
    assert!(places[0].amenity_ids.is_empty());

    // Deleting the amenity drops its links
    amenity::Entity::delete_by_id(wifi.id.clone()).exec(&db).await?;
    assert!(p.find_related(amenity::Entity).all(&db).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_review_crud() -> Result<()> {
    let db = setup_test_db().await?;

    let r = review::Model::new("place-1", "user-1", "Great stay");
    r.to_active_model().insert(&db).await?;
    let found = review::Entity::find()
        .filter(review::Column::PlaceId.eq("place-1"))
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(found.text, "Great stay");

    review::Entity::delete_by_id(r.id.clone()).exec(&db).await?;
    assert!(review::Entity::find_by_id(r.id).one(&db).await?.is_none());
    Ok(())
}
