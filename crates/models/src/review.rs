use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::object::fresh_identity;
use crate::{place, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub place_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Place,
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Place => Entity::belongs_to(place::Entity)
                .from(Column::PlaceId)
                .to(place::Column::Id)
                .into(),
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn new(place_id: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        let (id, now) = fresh_identity();
        Self {
            id,
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_active_model(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id.clone()),
            place_id: Set(self.place_id.clone()),
            user_id: Set(self.user_id.clone()),
            text: Set(self.text.clone()),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}
