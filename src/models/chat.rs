//! Direct chat entity model
//!
//! The participant pair is stored ordered, `user_a_id < user_b_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Chat)]
#[sea_orm(table_name = "chats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_a_id: Uuid,

    pub user_b_id: Uuid,

    #[schema(value_type = String, example = "2026-01-05T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
