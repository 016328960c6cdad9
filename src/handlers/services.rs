//! # Fee Services API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiResponse, MessageResponse};
use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::models::fee_service::Model as FeeServiceModel;
use crate::repositories::{FeeServiceChanges, FeeServiceRepository, NewFeeService};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    #[schema(example = "Water")]
    pub name: String,
    /// Price per unit in the smallest currency unit
    #[schema(example = 15000)]
    pub unit_price: i64,
    #[schema(example = "m3")]
    pub unit: String,
    #[serde(default)]
    #[schema(example = 11.0)]
    pub tax_percentage: f64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub unit_price: Option<i64>,
    pub unit: Option<String>,
    pub tax_percentage: Option<f64>,
}

/// Create a billable service (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/services",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ApiResponse<FeeServiceModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 409, description = "Service name already used", body = ApiError)
    ),
    tag = "services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FeeServiceModel>>), ApiError> {
    ctx.require_admin()?;

    let service = FeeServiceRepository::new(&state.db)
        .create(NewFeeService {
            name: request.name,
            unit_price: request.unit_price,
            unit: request.unit,
            tax_percentage: request.tax_percentage,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Service created", service)))
}

/// List services
#[utoipa::path(
    get,
    path = "/api/v1/services",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    responses(
        (status = 200, description = "Services", body = ApiResponse<Vec<FeeServiceModel>>)
    ),
    tag = "services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<FeeServiceModel>>>, ApiError> {
    let services = FeeServiceRepository::new(&state.db).list().await?;
    Ok(ApiResponse::ok("Services retrieved", services))
}

/// Get a service
#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Service UUID")
    ),
    responses(
        (status = 200, description = "Service", body = ApiResponse<FeeServiceModel>),
        (status = 404, description = "Service not found", body = ApiError)
    ),
    tag = "services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiPath(service_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<FeeServiceModel>>, ApiError> {
    let service = FeeServiceRepository::new(&state.db).get(service_id).await?;
    Ok(ApiResponse::ok("Service retrieved", service))
}

/// Update a service (administrators only)
#[utoipa::path(
    put,
    path = "/api/v1/services/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Service UUID")
    ),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = ApiResponse<FeeServiceModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "Service not found", body = ApiError)
    ),
    tag = "services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(service_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<FeeServiceModel>>, ApiError> {
    ctx.require_admin()?;

    let service = FeeServiceRepository::new(&state.db)
        .update(
            service_id,
            FeeServiceChanges {
                name: request.name,
                unit_price: request.unit_price,
                unit: request.unit,
                tax_percentage: request.tax_percentage,
            },
        )
        .await?;

    Ok(ApiResponse::ok("Service updated", service))
}

/// Delete a service no billing refers to (administrators only)
#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Service UUID")
    ),
    responses(
        (status = 200, description = "Service deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "Service not found", body = ApiError),
        (status = 409, description = "Service is billed", body = ApiError)
    ),
    tag = "services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(service_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    ctx.require_admin()?;

    FeeServiceRepository::new(&state.db).delete(service_id).await?;
    Ok(MessageResponse::ok("Service deleted"))
}
