//! Fee service entity model
//!
//! A billable service (water, parking, cleaning...) with a unit price in the
//! smallest currency unit and a tax percentage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = FeeService)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub unit_price: i64,

    /// Billing unit, e.g. "m3", "month", "kWh"
    pub unit: String,

    pub tax_percentage: f64,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
