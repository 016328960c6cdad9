//! Vehicle gate log entity model
//!
//! One row per gate transit. A row with `exited_at = None` means the vehicle
//! is currently inside; at most one such row exists per vehicle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = VehicleLog)]
#[sea_orm(table_name = "vehicle_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub vehicle_id: Uuid,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub entered_at: DateTimeWithTimeZone,

    #[schema(value_type = Option<String>)]
    pub exited_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
