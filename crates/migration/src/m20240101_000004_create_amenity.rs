//! Create `amenity` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Amenity::Table)
                    .if_not_exists()
                    .col(string_len(Amenity::Id, 60).primary_key())
                    .col(string_len(Amenity::Name, 128))
                    .col(timestamp_with_time_zone(Amenity::CreatedAt))
                    .col(timestamp_with_time_zone(Amenity::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Amenity::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Amenity { Table, Id, Name, CreatedAt, UpdatedAt }
