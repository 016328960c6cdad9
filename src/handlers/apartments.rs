//! # Apartments API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiResponse, MessageResponse, double_option};
use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::models::apartment::Model as ApartmentModel;
use crate::repositories::{ApartmentChanges, ApartmentRepository, NewApartment};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateApartmentRequest {
    #[schema(example = "A-1203")]
    pub name: String,
    #[schema(example = "Tower A")]
    pub building: Option<String>,
    #[schema(example = 12)]
    pub floor: i32,
    #[schema(example = 54.5)]
    pub area_m2: f64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateApartmentRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub building: Option<Option<String>>,
    pub floor: Option<i32>,
    pub area_m2: Option<f64>,
}

/// Register an apartment (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/apartments",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreateApartmentRequest,
    responses(
        (status = 201, description = "Apartment created", body = ApiResponse<ApartmentModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 409, description = "Apartment name already used", body = ApiError)
    ),
    tag = "apartments"
)]
pub async fn create_apartment(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateApartmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApartmentModel>>), ApiError> {
    ctx.require_admin()?;

    let apartment = ApartmentRepository::new(&state.db)
        .create(NewApartment {
            name: request.name,
            building: request.building,
            floor: request.floor,
            area_m2: request.area_m2,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Apartment created", apartment)))
}

/// List apartments
#[utoipa::path(
    get,
    path = "/api/v1/apartments",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    responses(
        (status = 200, description = "Apartments", body = ApiResponse<Vec<ApartmentModel>>)
    ),
    tag = "apartments"
)]
pub async fn list_apartments(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<ApartmentModel>>>, ApiError> {
    let apartments = ApartmentRepository::new(&state.db).list().await?;
    Ok(ApiResponse::ok("Apartments retrieved", apartments))
}

/// Get an apartment
#[utoipa::path(
    get,
    path = "/api/v1/apartments/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Apartment UUID")
    ),
    responses(
        (status = 200, description = "Apartment", body = ApiResponse<ApartmentModel>),
        (status = 404, description = "Apartment not found", body = ApiError)
    ),
    tag = "apartments"
)]
pub async fn get_apartment(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiPath(apartment_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ApartmentModel>>, ApiError> {
    let apartment = ApartmentRepository::new(&state.db).get(apartment_id).await?;
    Ok(ApiResponse::ok("Apartment retrieved", apartment))
}

/// Update an apartment (administrators only)
#[utoipa::path(
    put,
    path = "/api/v1/apartments/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Apartment UUID")
    ),
    request_body = UpdateApartmentRequest,
    responses(
        (status = 200, description = "Apartment updated", body = ApiResponse<ApartmentModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "Apartment not found", body = ApiError),
        (status = 409, description = "Apartment name already used", body = ApiError)
    ),
    tag = "apartments"
)]
pub async fn update_apartment(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(apartment_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateApartmentRequest>,
) -> Result<Json<ApiResponse<ApartmentModel>>, ApiError> {
    ctx.require_admin()?;

    let apartment = ApartmentRepository::new(&state.db)
        .update(
            apartment_id,
            ApartmentChanges {
                name: request.name,
                building: request.building,
                floor: request.floor,
                area_m2: request.area_m2,
            },
        )
        .await?;

    Ok(ApiResponse::ok("Apartment updated", apartment))
}

/// Delete an apartment without residents (administrators only)
#[utoipa::path(
    delete,
    path = "/api/v1/apartments/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Apartment UUID")
    ),
    responses(
        (status = 200, description = "Apartment deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "Apartment not found", body = ApiError),
        (status = 409, description = "Apartment still has residents", body = ApiError)
    ),
    tag = "apartments"
)]
pub async fn delete_apartment(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(apartment_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    ctx.require_admin()?;

    ApartmentRepository::new(&state.db).delete(apartment_id).await?;
    Ok(MessageResponse::ok("Apartment deleted"))
}
