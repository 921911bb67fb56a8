//! Create `state` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(State::Table)
                    .if_not_exists()
                    .col(string_len(State::Id, 60).primary_key())
                    .col(string_len(State::Name, 128))
                    .col(timestamp_with_time_zone(State::CreatedAt))
                    .col(timestamp_with_time_zone(State::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(State::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum State { Table, Id, Name, CreatedAt, UpdatedAt }
