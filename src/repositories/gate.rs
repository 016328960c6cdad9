//! # Gate Repository
//!
//! Check-in/out toggling for a user's vehicle. The read of the open log row
//! and the write that flips it share a transaction. Closing a row is a
//! conditional update that only matches while the row is still open, and a
//! second open row is rejected by the `idx_vehicle_logs_open` partial unique
//! index. Losing either race yields `GATE_STATE_CHANGED`; the caller decides
//! whether to toggle again.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::vehicle::vehicle_not_found;
use crate::error::{RepositoryError, is_unique_violation};
use crate::gate::{GateEvent, GateState, GateTransition};
use crate::models::vehicle_log::{
    self, ActiveModel as VehicleLogActiveModel, Model as VehicleLogModel,
};
use crate::models::{User, Vehicle, VehicleLog, vehicle};

/// Outcome of a toggle
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GateToggle {
    pub vehicle_id: Uuid,
    pub event: GateEvent,
    pub state: GateState,
    /// The log row that was inserted or closed
    pub log: VehicleLogModel,
}

/// Current position of a vehicle
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GateStatus {
    pub vehicle_id: Uuid,
    pub state: GateState,
    pub open_log: Option<VehicleLogModel>,
}

fn state_changed() -> RepositoryError {
    RepositoryError::conflict(
        "GATE_STATE_CHANGED",
        "gate state changed concurrently, try again",
    )
}

pub struct GateRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> GateRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flip the gate state of the user's vehicle
    pub async fn toggle(&self, user_id: Uuid) -> Result<GateToggle, RepositoryError> {
        User::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("USER_NOT_FOUND", "user not found"))?;

        let vehicle = Vehicle::find()
            .filter(vehicle::Column::OwnerId.eq(user_id))
            .order_by_asc(vehicle::Column::CreatedAt)
            .one(self.db)
            .await?
            .ok_or_else(vehicle_not_found)?;

        let txn = self.db.begin().await?;
        let open_log = find_open_log(&txn, vehicle.id).await?;
        let (transition, log) = apply_toggle(&txn, vehicle.id, open_log).await?;
        txn.commit().await?;

        tracing::info!(
            user_id = %user_id,
            vehicle_id = %vehicle.id,
            log_id = %log.id,
            event = ?transition.event(),
            "Gate toggled"
        );
        Ok(GateToggle {
            vehicle_id: vehicle.id,
            event: transition.event(),
            state: transition.target(),
            log,
        })
    }

    /// Flip the gate state of a vehicle from an open log observed earlier.
    ///
    /// Fails with `GATE_STATE_CHANGED`, writing nothing, when the
    /// observation no longer matches the stored logs.
    pub async fn toggle_observed(
        &self,
        vehicle_id: Uuid,
        observed_open_log: Option<VehicleLogModel>,
    ) -> Result<GateToggle, RepositoryError> {
        let txn = self.db.begin().await?;
        let (transition, log) = apply_toggle(&txn, vehicle_id, observed_open_log).await?;
        txn.commit().await?;

        Ok(GateToggle {
            vehicle_id,
            event: transition.event(),
            state: transition.target(),
            log,
        })
    }

    pub async fn status(&self, vehicle_id: Uuid) -> Result<GateStatus, RepositoryError> {
        let open_log = find_open_log(self.db, vehicle_id).await?;

        Ok(GateStatus {
            vehicle_id,
            state: GateState::from_open_log(open_log.as_ref()),
            open_log,
        })
    }

    /// Gate history, newest entry first
    pub async fn history(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<VehicleLogModel>, RepositoryError> {
        Ok(VehicleLog::find()
            .filter(vehicle_log::Column::VehicleId.eq(vehicle_id))
            .order_by_desc(vehicle_log::Column::EnteredAt)
            .order_by_desc(vehicle_log::Column::Id)
            .all(self.db)
            .await?)
    }
}

async fn find_open_log<C: ConnectionTrait>(
    conn: &C,
    vehicle_id: Uuid,
) -> Result<Option<VehicleLogModel>, RepositoryError> {
    Ok(VehicleLog::find()
        .filter(vehicle_log::Column::VehicleId.eq(vehicle_id))
        .filter(vehicle_log::Column::ExitedAt.is_null())
        .one(conn)
        .await?)
}

/// Write the transition implied by `open_log`: insert an entry row, or close
/// the open row if it is still open.
async fn apply_toggle<C: ConnectionTrait>(
    conn: &C,
    vehicle_id: Uuid,
    open_log: Option<VehicleLogModel>,
) -> Result<(GateTransition, VehicleLogModel), RepositoryError> {
    let state = GateState::from_open_log(open_log.as_ref());
    let transition = state
        .next(open_log.as_ref().map(|log| log.id))
        .ok_or_else(state_changed)?;
    let now: DateTimeWithTimeZone = Utc::now().into();

    let log = match (transition, open_log) {
        (GateTransition::Enter, _) => {
            let entry = VehicleLogActiveModel {
                id: Set(Uuid::new_v4()),
                vehicle_id: Set(vehicle_id),
                entered_at: Set(now),
                exited_at: Set(None),
            };
            entry.insert(conn).await.map_err(|err| {
                if is_unique_violation(&err) {
                    state_changed()
                } else {
                    err.into()
                }
            })?
        }
        (GateTransition::Exit { log_id }, Some(open)) => {
            let result = VehicleLog::update_many()
                .col_expr(vehicle_log::Column::ExitedAt, Expr::value(now))
                .filter(vehicle_log::Column::Id.eq(log_id))
                .filter(vehicle_log::Column::ExitedAt.is_null())
                .exec(conn)
                .await?;
            if result.rows_affected != 1 {
                return Err(state_changed());
            }
            VehicleLogModel {
                exited_at: Some(now),
                ..open
            }
        }
        (GateTransition::Exit { .. }, None) => return Err(state_changed()),
    };

    Ok((transition, log))
}
