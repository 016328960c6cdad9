//! # Properties API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiQuery, ApiResponse, MessageResponse, double_option};
use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::models::property::Model as PropertyModel;
use crate::repositories::{NewProperty, PropertyChanges, PropertyRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePropertyRequest {
    #[schema(example = "Blue bicycle")]
    pub name: String,
    pub description: Option<String>,
    /// Administrators may create a property on behalf of another user
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePropertyRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPropertiesQuery {
    /// Only properties of this owner (administrators only)
    pub owner_id: Option<Uuid>,
}

/// Create a property
#[utoipa::path(
    post,
    path = "/api/v1/properties",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property created", body = ApiResponse<PropertyModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Owner not found", body = ApiError)
    ),
    tag = "properties"
)]
pub async fn create_property(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PropertyModel>>), ApiError> {
    let owner_id = request.owner_id.unwrap_or(ctx.user_id);
    ctx.require_self_or_admin(owner_id)?;

    let property = PropertyRepository::new(&state.db)
        .create(NewProperty {
            owner_id,
            name: request.name,
            description: request.description,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Property created", property)))
}

/// List properties; residents only see their own
#[utoipa::path(
    get,
    path = "/api/v1/properties",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader, ListPropertiesQuery),
    responses(
        (status = 200, description = "Properties", body = ApiResponse<Vec<PropertyModel>>),
        (status = 403, description = "Not allowed", body = ApiError)
    ),
    tag = "properties"
)]
pub async fn list_properties(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiQuery(query): ApiQuery<ListPropertiesQuery>,
) -> Result<Json<ApiResponse<Vec<PropertyModel>>>, ApiError> {
    let owner_filter = if ctx.is_admin() {
        query.owner_id
    } else {
        if let Some(owner_id) = query.owner_id {
            ctx.require_self_or_admin(owner_id)?;
        }
        Some(ctx.user_id)
    };

    let properties = PropertyRepository::new(&state.db).list(owner_filter).await?;
    Ok(ApiResponse::ok("Properties retrieved", properties))
}

/// Get a property
#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Property UUID")
    ),
    responses(
        (status = 200, description = "Property", body = ApiResponse<PropertyModel>),
        (status = 404, description = "Property not found", body = ApiError)
    ),
    tag = "properties"
)]
pub async fn get_property(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiPath(property_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<PropertyModel>>, ApiError> {
    let property = PropertyRepository::new(&state.db).get(property_id).await?;
    Ok(ApiResponse::ok("Property retrieved", property))
}

/// Update name or description (owner or administrator)
#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Property UUID")
    ),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Property updated", body = ApiResponse<PropertyModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Property not found", body = ApiError)
    ),
    tag = "properties"
)]
pub async fn update_property(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(property_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdatePropertyRequest>,
) -> Result<Json<ApiResponse<PropertyModel>>, ApiError> {
    let repo = PropertyRepository::new(&state.db);
    let property = repo.get(property_id).await?;
    ctx.require_self_or_admin(property.owner_id)?;

    let property = repo
        .update(
            property_id,
            PropertyChanges {
                name: request.name,
                description: request.description,
            },
        )
        .await?;

    Ok(ApiResponse::ok("Property updated", property))
}

/// Delete a property (owner or administrator)
#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Property UUID")
    ),
    responses(
        (status = 200, description = "Property deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Property not found", body = ApiError),
        (status = 409, description = "Vehicle has gate history", body = ApiError)
    ),
    tag = "properties"
)]
pub async fn delete_property(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(property_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = PropertyRepository::new(&state.db);
    let property = repo.get(property_id).await?;
    ctx.require_self_or_admin(property.owner_id)?;

    repo.delete(property_id).await?;
    Ok(MessageResponse::ok("Property deleted"))
}
