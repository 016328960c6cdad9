//! Billing line item entity model
//!
//! Price and tax are copied from the service when the billing is created so
//! later service edits do not rewrite issued bills.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = BillingItem)]
#[sea_orm(table_name = "billing_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub billing_id: Uuid,

    pub service_id: Uuid,

    pub quantity: f64,

    pub unit_price: i64,

    pub tax_percentage: f64,

    pub amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing::Entity",
        from = "Column::BillingId",
        to = "super::billing::Column::Id"
    )]
    Billing,
}

impl Related<super::billing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Billing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
