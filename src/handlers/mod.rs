//! # API Handlers
//!
//! HTTP endpoint handlers for the apartment management API, one module per
//! resource. Handlers check the acting user's permissions, delegate to a
//! repository and wrap the result in the success envelope.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::error::{ApiError, ErrorType};
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod apartments;
pub mod billings;
pub mod chats;
pub mod documents;
pub mod posts;
pub mod properties;
pub mod reports;
pub mod services;
pub mod types;
pub mod users;
pub mod vehicles;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health status of the service and its database
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

/// Liveness and database connectivity check
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::warn!(error = %err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
    })?;

    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}

/// Fallback for unknown routes
pub async fn route_not_found() -> ApiError {
    ErrorType::NotFound.into()
}

/// Fallback for known routes called with an unsupported method
pub async fn method_not_allowed() -> ApiError {
    ErrorType::MethodNotAllowed.into()
}

#[cfg(test)]
mod tests;
