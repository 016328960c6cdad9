//! # Billings API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiQuery, ApiResponse, MessageResponse};
use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::models::billing::Model as BillingModel;
use crate::repositories::{BillingRepository, BillingWithItems, NewBilling, NewBillingItem};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillingItemRequest {
    pub service_id: Uuid,
    #[schema(example = 12.5)]
    pub quantity: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBillingRequest {
    pub user_id: Uuid,
    #[schema(example = 2026)]
    pub period_year: i32,
    #[schema(example = 1)]
    pub period_month: i32,
    pub items: Vec<BillingItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub paid: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBillingsQuery {
    /// Only billings of this user (administrators only)
    pub user_id: Option<Uuid>,
}

/// Issue a billing with its items (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/billings",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreateBillingRequest,
    responses(
        (status = 201, description = "Billing created", body = ApiResponse<BillingWithItems>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "User or service not found", body = ApiError)
    ),
    tag = "billings"
)]
pub async fn create_billing(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateBillingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BillingWithItems>>), ApiError> {
    ctx.require_admin()?;

    let billing = BillingRepository::new(&state.db)
        .create(NewBilling {
            user_id: request.user_id,
            period_year: request.period_year,
            period_month: request.period_month,
            items: request
                .items
                .into_iter()
                .map(|item| NewBillingItem {
                    service_id: item.service_id,
                    quantity: item.quantity,
                })
                .collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Billing created", billing)))
}

/// List billings; residents only see their own
#[utoipa::path(
    get,
    path = "/api/v1/billings",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader, ListBillingsQuery),
    responses(
        (status = 200, description = "Billings, newest period first", body = ApiResponse<Vec<BillingModel>>),
        (status = 403, description = "Not allowed", body = ApiError)
    ),
    tag = "billings"
)]
pub async fn list_billings(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiQuery(query): ApiQuery<ListBillingsQuery>,
) -> Result<Json<ApiResponse<Vec<BillingModel>>>, ApiError> {
    let user_filter = if ctx.is_admin() {
        query.user_id
    } else {
        if let Some(user_id) = query.user_id {
            ctx.require_self_or_admin(user_id)?;
        }
        Some(ctx.user_id)
    };

    let billings = BillingRepository::new(&state.db).list(user_filter).await?;
    Ok(ApiResponse::ok("Billings retrieved", billings))
}

/// Get a billing with its items (billed user or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/billings/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Billing UUID")
    ),
    responses(
        (status = 200, description = "Billing", body = ApiResponse<BillingWithItems>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Billing not found", body = ApiError)
    ),
    tag = "billings"
)]
pub async fn get_billing(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(billing_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<BillingWithItems>>, ApiError> {
    let billing = BillingRepository::new(&state.db)
        .get_with_items(billing_id)
        .await?;
    ctx.require_self_or_admin(billing.billing.user_id)?;

    Ok(ApiResponse::ok("Billing retrieved", billing))
}

/// Mark a billing paid or unpaid (administrators only)
#[utoipa::path(
    patch,
    path = "/api/v1/billings/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Billing UUID")
    ),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment state updated", body = ApiResponse<BillingModel>),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "Billing not found", body = ApiError)
    ),
    tag = "billings"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(billing_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdatePaymentRequest>,
) -> Result<Json<ApiResponse<BillingModel>>, ApiError> {
    ctx.require_admin()?;

    let billing = BillingRepository::new(&state.db)
        .set_paid(billing_id, request.paid)
        .await?;

    let message = if billing.paid {
        "Billing marked as paid"
    } else {
        "Billing marked as unpaid"
    };
    Ok(ApiResponse::ok(message, billing))
}

/// Delete an unpaid billing (administrators only)
#[utoipa::path(
    delete,
    path = "/api/v1/billings/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Billing UUID")
    ),
    responses(
        (status = 200, description = "Billing deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required", body = ApiError),
        (status = 404, description = "Billing not found", body = ApiError),
        (status = 409, description = "Billing already paid", body = ApiError)
    ),
    tag = "billings"
)]
pub async fn delete_billing(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(billing_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    ctx.require_admin()?;

    BillingRepository::new(&state.db).delete(billing_id).await?;
    Ok(MessageResponse::ok("Billing deleted"))
}
