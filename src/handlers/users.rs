//! # Users API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiResponse, MessageResponse, double_option};
use crate::auth::RequestContext;
use crate::error::{ApiError, forbidden};
use crate::models::user::{Model as UserModel, UserRole};
use crate::repositories::{NewUser, UserChanges, UserRepository};
use crate::server::AppState;

/// Request payload for creating a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Dewi Lestari")]
    pub full_name: String,
    #[schema(example = "dewi@example.com")]
    pub email: String,
    #[schema(example = "+62 812-3456-7890")]
    pub phone: String,
    /// Defaults to `resident`
    pub role: Option<UserRole>,
    pub apartment_id: Option<Uuid>,
}

/// Request payload for updating a user; omitted fields are left unchanged
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Only administrators may change roles
    pub role: Option<UserRole>,
    /// `null` moves the user out of their apartment
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub apartment_id: Option<Option<Uuid>>,
}

/// Create a user (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserModel>>), ApiError> {
    ctx.require_admin()?;

    let user = UserRepository::new(&state.db)
        .create(NewUser {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            role: request.role.unwrap_or_default(),
            apartment_id: request.apartment_id,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("User created", user)))
}

/// List all users (administrators only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    responses(
        (status = 200, description = "Users", body = ApiResponse<Vec<UserModel>>),
        (status = 403, description = "Administrator role required", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<UserModel>>>, ApiError> {
    ctx.require_admin()?;

    let users = UserRepository::new(&state.db).list().await?;
    Ok(ApiResponse::ok("Users retrieved", users))
}

/// The acting user
#[utoipa::path(
    get,
    path = "/api/v1/me",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    responses(
        (status = 200, description = "Acting user", body = ApiResponse<UserModel>),
        (status = 401, description = "Missing or invalid credentials", body = ApiError)
    ),
    tag = "users"
)]
pub async fn me(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<UserModel>>, ApiError> {
    let user = UserRepository::new(&state.db).get(ctx.user_id).await?;
    Ok(ApiResponse::ok("User retrieved", user))
}

/// Get a user (self or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserModel>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<UserModel>>, ApiError> {
    ctx.require_self_or_admin(user_id)?;

    let user = UserRepository::new(&state.db).get(user_id).await?;
    Ok(ApiResponse::ok("User retrieved", user))
}

/// Update a user (self or administrator)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserModel>>, ApiError> {
    ctx.require_self_or_admin(user_id)?;
    if !ctx.is_admin() && (request.role.is_some() || request.apartment_id.is_some()) {
        return Err(forbidden(Some(
            "Only administrators may change roles or apartment assignments",
        )));
    }

    let user = UserRepository::new(&state.db)
        .update(
            user_id,
            UserChanges {
                full_name: request.full_name,
                email: request.email,
                phone: request.phone,
                role: request.role,
                apartment_id: request.apartment_id,
            },
        )
        .await?;

    Ok(ApiResponse::ok("User updated", user))
}

/// Delete a user (administrators only)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "User's vehicle has gate history", body = ApiError)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    ctx.require_admin()?;
    if ctx.user_id == user_id {
        return Err(forbidden(Some("Administrators cannot delete themselves")));
    }

    UserRepository::new(&state.db).delete(user_id).await?;
    Ok(MessageResponse::ok("User deleted"))
}
