//! # Vehicles and Gate API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiResponse};
use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::gate::GateEvent;
use crate::models::vehicle::Model as VehicleModel;
use crate::models::vehicle_log::Model as VehicleLogModel;
use crate::repositories::{
    GateRepository, GateStatus, GateToggle, NewVehicle, VehicleRegistration, VehicleRepository,
};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterVehicleRequest {
    /// Administrators may register a vehicle for another user
    pub owner_id: Option<Uuid>,
    #[schema(example = "B 1234 XYZ")]
    pub license_plate: String,
    #[schema(example = "Toyota")]
    pub brand: Option<String>,
    #[schema(example = "Avanza")]
    pub model: Option<String>,
    #[schema(example = 2021)]
    pub year: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GateToggleRequest {
    /// Owner of the vehicle passing the gate
    pub user_id: Uuid,
}

/// Register the user's vehicle (one per user)
#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = RegisterVehicleRequest,
    responses(
        (status = 201, description = "Vehicle registered", body = ApiResponse<VehicleRegistration>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Owner not found", body = ApiError),
        (status = 409, description = "User already has a vehicle or plate is taken", body = ApiError)
    ),
    tag = "vehicles"
)]
pub async fn register_vehicle(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleRegistration>>), ApiError> {
    let owner_id = request.owner_id.unwrap_or(ctx.user_id);
    ctx.require_self_or_admin(owner_id)?;

    let registration = VehicleRepository::new(&state.db)
        .register(NewVehicle {
            owner_id,
            license_plate: request.license_plate,
            brand: request.brand,
            model: request.model,
            year: request.year,
            description: request.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Vehicle registered", registration),
    ))
}

/// List all vehicles (administrators only)
#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    responses(
        (status = 200, description = "Vehicles", body = ApiResponse<Vec<VehicleModel>>),
        (status = 403, description = "Administrator role required", body = ApiError)
    ),
    tag = "vehicles"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<VehicleModel>>>, ApiError> {
    ctx.require_admin()?;

    let vehicles = VehicleRepository::new(&state.db).list().await?;
    Ok(ApiResponse::ok("Vehicles retrieved", vehicles))
}

/// The vehicle of a user (self or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/vehicle",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "Vehicle", body = ApiResponse<VehicleRegistration>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "User has no vehicle", body = ApiError)
    ),
    tag = "vehicles"
)]
pub async fn get_user_vehicle(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<VehicleRegistration>>, ApiError> {
    ctx.require_self_or_admin(user_id)?;

    let registration = VehicleRepository::new(&state.db).get_for_user(user_id).await?;
    Ok(ApiResponse::ok("Vehicle retrieved", registration))
}

async fn owned_vehicle(
    state: &AppState,
    ctx: &RequestContext,
    vehicle_id: Uuid,
) -> Result<VehicleModel, ApiError> {
    let vehicle = VehicleRepository::new(&state.db).get(vehicle_id).await?;
    ctx.require_self_or_admin(vehicle.owner_id)?;
    Ok(vehicle)
}

/// Current gate state of a vehicle (owner or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}/gate",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Vehicle UUID")
    ),
    responses(
        (status = 200, description = "Gate state", body = ApiResponse<GateStatus>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Vehicle not found", body = ApiError)
    ),
    tag = "gate"
)]
pub async fn gate_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(vehicle_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<GateStatus>>, ApiError> {
    let vehicle = owned_vehicle(&state, &ctx, vehicle_id).await?;

    let status = GateRepository::new(&state.db).status(vehicle.id).await?;
    Ok(ApiResponse::ok("Gate state retrieved", status))
}

/// Gate history of a vehicle, newest first (owner or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}/logs",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Vehicle UUID")
    ),
    responses(
        (status = 200, description = "Gate logs", body = ApiResponse<Vec<VehicleLogModel>>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Vehicle not found", body = ApiError)
    ),
    tag = "gate"
)]
pub async fn gate_logs(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(vehicle_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<VehicleLogModel>>>, ApiError> {
    let vehicle = owned_vehicle(&state, &ctx, vehicle_id).await?;

    let logs = GateRepository::new(&state.db).history(vehicle.id).await?;
    Ok(ApiResponse::ok("Gate logs retrieved", logs))
}

/// Check a user's vehicle in or out of the gate
#[utoipa::path(
    post,
    path = "/api/v1/gate/toggle",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = GateToggleRequest,
    responses(
        (status = 200, description = "Vehicle entered or exited", body = ApiResponse<GateToggle>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "User or vehicle not found", body = ApiError),
        (status = 409, description = "Gate state changed concurrently", body = ApiError)
    ),
    tag = "gate"
)]
pub async fn toggle_gate(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<GateToggleRequest>,
) -> Result<Json<ApiResponse<GateToggle>>, ApiError> {
    ctx.require_self_or_admin(request.user_id)?;

    let toggle = GateRepository::new(&state.db).toggle(request.user_id).await?;
    let message = match toggle.event {
        GateEvent::Entered => "Vehicle entered",
        GateEvent::Exited => "Vehicle exited",
    };

    Ok(ApiResponse::ok(message, toggle))
}
