//! Migration to create the property_reports table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PropertyReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PropertyReports::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PropertyReports::PropertyId).uuid().not_null())
                    .col(ColumnDef::new(PropertyReports::ReporterId).uuid().not_null())
                    .col(ColumnDef::new(PropertyReports::Status).text().not_null())
                    .col(ColumnDef::new(PropertyReports::Content).text().not_null())
                    .col(
                        ColumnDef::new(PropertyReports::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PropertyReports::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PropertyReports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_reports_property_id")
                            .from(PropertyReports::Table, PropertyReports::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_reports_reporter_id")
                            .from(PropertyReports::Table, PropertyReports::ReporterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup of the latest approved report per property
        manager
            .create_index(
                Index::create()
                    .name("idx_property_reports_property_approved")
                    .table(PropertyReports::Table)
                    .col(PropertyReports::PropertyId)
                    .col(PropertyReports::Approved)
                    .col(PropertyReports::ApprovedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_property_reports_property_approved")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PropertyReports::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PropertyReports {
    Table,
    Id,
    PropertyId,
    ReporterId,
    Status,
    Content,
    Approved,
    ApprovedAt,
    CreatedAt,
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
