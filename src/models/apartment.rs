//! Apartment entity model

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Apartment)]
#[sea_orm(table_name = "apartments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Unit label, unique across the estate (e.g. "A-1203")
    pub name: String,

    pub building: Option<String>,

    pub floor: i32,

    pub area_m2: f64,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
