//! Billing entity model

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Billing)]
#[sea_orm(table_name = "billings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub period_year: i32,

    pub period_month: i32,

    /// Sum of the item amounts, tax included
    pub total_amount: i64,

    pub paid: bool,

    #[schema(value_type = Option<String>)]
    pub paid_at: Option<DateTimeWithTimeZone>,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::billing_item::Entity")]
    Items,
}

impl Related<super::billing_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
