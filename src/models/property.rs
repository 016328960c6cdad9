//! Property entity model
//!
//! Any trackable item owned by a resident, vehicles included. `status` is a
//! derived value: it mirrors the status of the most recently approved report
//! for the property and is rewritten whenever approvals change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Property)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub owner_id: Uuid,

    pub name: String,

    pub kind: PropertyKind,

    pub description: Option<String>,

    pub status: PropertyStatus,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PropertyKind {
    #[sea_orm(string_value = "vehicle")]
    #[serde(rename = "vehicle")]
    Vehicle,

    #[sea_orm(string_value = "other")]
    #[serde(rename = "other")]
    #[default]
    Other,
}

/// Lost-and-found status shared by properties and their reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PropertyStatus {
    #[sea_orm(string_value = "found")]
    #[serde(rename = "found")]
    #[default]
    Found,

    #[sea_orm(string_value = "not found")]
    #[serde(rename = "not found")]
    NotFound,

    #[sea_orm(string_value = "deleted")]
    #[serde(rename = "deleted")]
    Deleted,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
