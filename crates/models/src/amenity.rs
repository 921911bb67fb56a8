use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::object::fresh_identity;
use crate::{place, place_amenity};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "amenity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl Related<place::Entity> for Entity {
    fn to() -> RelationDef {
        place_amenity::Relation::Place.def()
    }

    fn via() -> Option<RelationDef> {
        Some(place_amenity::Relation::Amenity.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        let (id, now) = fresh_identity();
        Self { id, name: name.into(), created_at: now, updated_at: now }
    }

    pub fn to_active_model(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id.clone()),
            name: Set(self.name.clone()),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}
