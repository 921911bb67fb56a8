//! Create `city` table.
//!
//! `state_id` is a plain column: parent existence is checked by callers and
//! deleting a state leaves its cities in place.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(string_len(City::Id, 60).primary_key())
                    .col(string_len(City::StateId, 60))
                    .col(string_len(City::Name, 128))
                    .col(timestamp_with_time_zone(City::CreatedAt))
                    .col(timestamp_with_time_zone(City::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(City::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum City { Table, Id, StateId, Name, CreatedAt, UpdatedAt }
