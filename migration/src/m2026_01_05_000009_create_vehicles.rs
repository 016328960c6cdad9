//! Migration to create the vehicles and vehicle_logs tables.
//!
//! A vehicle is backed by a property of kind `vehicle`. Each vehicle_logs row
//! is one gate transit; a null `exited_at` means the vehicle is inside.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vehicles::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Vehicles::PropertyId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vehicles::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Vehicles::LicensePlate)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vehicles::Brand).text().null())
                    .col(ColumnDef::new(Vehicles::Model).text().null())
                    .col(ColumnDef::new(Vehicles::Year).integer().null())
                    .col(
                        ColumnDef::new(Vehicles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicles_property_id")
                            .from(Vehicles::Table, Vehicles::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicles_owner_id")
                            .from(Vehicles::Table, Vehicles::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicles_owner_id")
                    .table(Vehicles::Table)
                    .col(Vehicles::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VehicleLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VehicleLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VehicleLogs::VehicleId).uuid().not_null())
                    .col(
                        ColumnDef::new(VehicleLogs::EnteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VehicleLogs::ExitedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_logs_vehicle_id")
                            .from(VehicleLogs::Table, VehicleLogs::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_logs_vehicle_entered_at")
                    .table(VehicleLogs::Table)
                    .col(VehicleLogs::VehicleId)
                    .col(VehicleLogs::EnteredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VehicleLogs::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_vehicles_owner_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Vehicles {
    Table,
    Id,
    PropertyId,
    OwnerId,
    LicensePlate,
    Brand,
    Model,
    Year,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VehicleLogs {
    Table,
    Id,
    VehicleId,
    EnteredAt,
    ExitedAt,
}

#[derive(DeriveIden)]
enum Properties {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
