//! # Vehicle Gate State Machine
//!
//! A vehicle is either `Outside` or `Inside` the estate gate. The state is
//! never stored directly: it is derived from the vehicle's most recent log
//! row, where an open row (no exit timestamp) means the vehicle is inside.
//!
//! ```text
//!   Outside --toggle--> Inside    (insert row, entered_at = now)
//!   Inside  --toggle--> Outside   (set exited_at = now on the open row)
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::vehicle_log::Model as VehicleLogModel;

/// Where a vehicle currently is relative to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Outside,
    Inside,
}

/// Result of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateEvent {
    Entered,
    Exited,
}

/// The write a toggle must perform to move to the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Insert a new open log row.
    Enter,
    /// Close the open log row with this id.
    Exit { log_id: Uuid },
}

impl GateState {
    /// Derives the gate state from the vehicle's open log row, if any.
    pub fn from_open_log(open_log: Option<&VehicleLogModel>) -> Self {
        match open_log {
            Some(log) if log.is_open() => GateState::Inside,
            _ => GateState::Outside,
        }
    }

    /// Plans the transition out of the current state.
    ///
    /// `open_log_id` must be `Some` exactly when the state is `Inside`.
    pub fn next(self, open_log_id: Option<Uuid>) -> Option<GateTransition> {
        match (self, open_log_id) {
            (GateState::Outside, None) => Some(GateTransition::Enter),
            (GateState::Inside, Some(log_id)) => Some(GateTransition::Exit { log_id }),
            _ => None,
        }
    }
}

impl GateTransition {
    pub fn event(&self) -> GateEvent {
        match self {
            GateTransition::Enter => GateEvent::Entered,
            GateTransition::Exit { .. } => GateEvent::Exited,
        }
    }

    /// State the vehicle is in once the transition has been applied.
    pub fn target(&self) -> GateState {
        match self {
            GateTransition::Enter => GateState::Inside,
            GateTransition::Exit { .. } => GateState::Outside,
        }
    }
}
