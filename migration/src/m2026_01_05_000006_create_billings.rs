//! Migration to create the billings and billing_items tables.
//!
//! A billing is written together with its items in one transaction; items
//! snapshot the service price and tax at billing time.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Billings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Billings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Billings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Billings::PeriodYear).integer().not_null())
                    .col(ColumnDef::new(Billings::PeriodMonth).integer().not_null())
                    .col(
                        ColumnDef::new(Billings::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Billings::Paid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Billings::PaidAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Billings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billings_user_id")
                            .from(Billings::Table, Billings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_billings_user_id")
                    .table(Billings::Table)
                    .col(Billings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BillingItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillingItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillingItems::BillingId).uuid().not_null())
                    .col(ColumnDef::new(BillingItems::ServiceId).uuid().not_null())
                    .col(ColumnDef::new(BillingItems::Quantity).double().not_null())
                    .col(
                        ColumnDef::new(BillingItems::UnitPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillingItems::TaxPercentage)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillingItems::Amount).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_items_billing_id")
                            .from(BillingItems::Table, BillingItems::BillingId)
                            .to(Billings::Table, Billings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_items_service_id")
                            .from(BillingItems::Table, BillingItems::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_billing_items_billing_id")
                    .table(BillingItems::Table)
                    .col(BillingItems::BillingId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillingItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Billings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Billings {
    Table,
    Id,
    UserId,
    PeriodYear,
    PeriodMonth,
    TotalAmount,
    Paid,
    PaidAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BillingItems {
    Table,
    Id,
    BillingId,
    ServiceId,
    Quantity,
    UnitPrice,
    TaxPercentage,
    Amount,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
}
