use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::object::fresh_identity;
use crate::state;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub state_id: String,
    pub name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    State,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::State => Entity::belongs_to(state::Entity)
                .from(Column::StateId)
                .to(state::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn new(state_id: impl Into<String>, name: impl Into<String>) -> Self {
        let (id, now) = fresh_identity();
        Self { id, state_id: state_id.into(), name: name.into(), created_at: now, updated_at: now }
    }

    pub fn to_active_model(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id.clone()),
            state_id: Set(self.state_id.clone()),
            name: Set(self.name.clone()),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}
