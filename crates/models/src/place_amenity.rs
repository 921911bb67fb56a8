//! Join table linking places to amenities (relational backend only).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{amenity, place};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "place_amenity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub place_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub amenity_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Place,
    Amenity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Place => Entity::belongs_to(place::Entity)
                .from(Column::PlaceId)
                .to(place::Column::Id)
                .into(),
            Relation::Amenity => Entity::belongs_to(amenity::Entity)
                .from(Column::AmenityId)
                .to(amenity::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
