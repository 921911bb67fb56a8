//! Create `place` table. Amenities live in `place_amenity`, not here.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Place::Table)
                    .if_not_exists()
                    .col(string_len(Place::Id, 60).primary_key())
                    .col(string_len(Place::CityId, 60))
                    .col(string_len(Place::UserId, 60))
                    .col(string_len(Place::Name, 128))
                    .col(string_len_null(Place::Description, 1024))
                    .col(integer(Place::NumberRooms).default(0))
                    .col(integer(Place::NumberBathrooms).default(0))
                    .col(integer(Place::MaxGuest).default(0))
                    .col(integer(Place::PriceByNight).default(0))
                    .col(double(Place::Latitude).default(0.0))
                    .col(double(Place::Longitude).default(0.0))
                    .col(timestamp_with_time_zone(Place::CreatedAt))
                    .col(timestamp_with_time_zone(Place::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Place::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Place {
    Table,
    Id,
    CityId,
    UserId,
    Name,
    Description,
    NumberRooms,
    NumberBathrooms,
    MaxGuest,
    PriceByNight,
    Latitude,
    Longitude,
    CreatedAt,
    UpdatedAt,
}
