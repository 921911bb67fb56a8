use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::object::fresh_identity;
use crate::{amenity, city, place_amenity, user};

/// A rentable place inside a city.
///
/// `amenity_ids` is the file-backend representation of the amenity association
/// and is not mapped to a column; the relational backend links through
/// `place_amenity` instead.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "place")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub city_id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub number_rooms: i32,
    pub number_bathrooms: i32,
    pub max_guest: i32,
    pub price_by_night: i32,
    #[sea_orm(column_type = "Double")]
    pub latitude: f64,
    #[sea_orm(column_type = "Double")]
    pub longitude: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[sea_orm(ignore)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenity_ids: Vec<String>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    City,
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::City => Entity::belongs_to(city::Entity)
                .from(Column::CityId)
                .to(city::Column::Id)
                .into(),
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<amenity::Entity> for Entity {
    fn to() -> RelationDef {
        place_amenity::Relation::Amenity.def()
    }

    fn via() -> Option<RelationDef> {
        Some(place_amenity::Relation::Place.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn new(city_id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let (id, now) = fresh_identity();
        Self {
            id,
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: 0.0,
            longitude: 0.0,
            created_at: now,
            updated_at: now,
            amenity_ids: Vec::new(),
        }
    }

    pub fn to_active_model(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id.clone()),
            city_id: Set(self.city_id.clone()),
            user_id: Set(self.user_id.clone()),
            name: Set(self.name.clone()),
            description: Set(self.description.clone()),
            number_rooms: Set(self.number_rooms),
            number_bathrooms: Set(self.number_bathrooms),
            max_guest: Set(self.max_guest),
            price_by_night: Set(self.price_by_night),
            latitude: Set(self.latitude),
            longitude: Set(self.longitude),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}
