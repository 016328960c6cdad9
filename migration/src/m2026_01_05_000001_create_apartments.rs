//! Migration to create the apartments table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Apartments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Apartments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Apartments::Name)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Apartments::Building).text().null())
                    .col(ColumnDef::new(Apartments::Floor).integer().not_null())
                    .col(ColumnDef::new(Apartments::AreaM2).double().not_null())
                    .col(
                        ColumnDef::new(Apartments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Apartments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Apartments {
    Table,
    Id,
    Name,
    Building,
    Floor,
    AreaM2,
    CreatedAt,
}
