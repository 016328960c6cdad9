//! # Property Reports API Handlers
//!
//! Lost-and-found reports. Approving or un-approving a report rewrites the
//! status of the reported property.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::auth::RequestContext;
use crate::error::{ApiError, forbidden};
use crate::models::property::{Model as PropertyModel, PropertyStatus};
use crate::models::property_report::Model as ReportModel;
use crate::repositories::{NewPropertyReport, PropertyReportFilter, PropertyReportRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReportRequest {
    pub property_id: Uuid,
    /// One of `found`, `not found`, `deleted`
    pub status: PropertyStatus,
    #[schema(example = "Left at the lobby on Monday evening")]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReportsQuery {
    pub property_id: Option<Uuid>,
    pub approved: Option<bool>,
}

/// A report and the property status it produced
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportApproval {
    pub report: ReportModel,
    pub property: PropertyModel,
}

/// File a report against any property
#[utoipa::path(
    post,
    path = "/api/v1/property-reports",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = ApiResponse<ReportModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Property not found", body = ApiError)
    ),
    tag = "property-reports"
)]
pub async fn create_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateReportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReportModel>>), ApiError> {
    let report = PropertyReportRepository::new(&state.db)
        .create(NewPropertyReport {
            property_id: request.property_id,
            reporter_id: ctx.user_id,
            status: request.status,
            content: request.content,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Report filed", report)))
}

/// List reports
#[utoipa::path(
    get,
    path = "/api/v1/property-reports",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader, ListReportsQuery),
    responses(
        (status = 200, description = "Reports, newest first", body = ApiResponse<Vec<ReportModel>>)
    ),
    tag = "property-reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiQuery(query): ApiQuery<ListReportsQuery>,
) -> Result<Json<ApiResponse<Vec<ReportModel>>>, ApiError> {
    let reports = PropertyReportRepository::new(&state.db)
        .list(PropertyReportFilter {
            property_id: query.property_id,
            approved: query.approved,
        })
        .await?;

    Ok(ApiResponse::ok("Reports retrieved", reports))
}

/// Get a report
#[utoipa::path(
    get,
    path = "/api/v1/property-reports/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Report UUID")
    ),
    responses(
        (status = 200, description = "Report", body = ApiResponse<ReportModel>),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    tag = "property-reports"
)]
pub async fn get_report(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ReportModel>>, ApiError> {
    let report = PropertyReportRepository::new(&state.db).get(report_id).await?;
    Ok(ApiResponse::ok("Report retrieved", report))
}

async fn set_approval(
    state: &AppState,
    ctx: RequestContext,
    report_id: Uuid,
    approved: bool,
) -> Result<ReportApproval, ApiError> {
    let repo = PropertyReportRepository::new(&state.db);
    let report = repo.get(report_id).await?;
    let property = repo.property_of(&report).await?;
    if !ctx.is_admin() && property.owner_id != ctx.user_id {
        return Err(forbidden(Some(
            "Only an administrator or the property owner may review reports",
        )));
    }

    let (report, property) = repo.set_approval(report_id, approved).await?;
    Ok(ReportApproval { report, property })
}

/// Approve a report; the property takes the report's status
#[utoipa::path(
    post,
    path = "/api/v1/property-reports/{id}/approve",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Report UUID")
    ),
    responses(
        (status = 200, description = "Report approved", body = ApiResponse<ReportApproval>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    tag = "property-reports"
)]
pub async fn approve_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ReportApproval>>, ApiError> {
    let approval = set_approval(&state, ctx, report_id, true).await?;
    Ok(ApiResponse::ok("Report approved", approval))
}

/// Withdraw approval; the property status is recomputed
#[utoipa::path(
    post,
    path = "/api/v1/property-reports/{id}/unapprove",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Report UUID")
    ),
    responses(
        (status = 200, description = "Approval withdrawn", body = ApiResponse<ReportApproval>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    tag = "property-reports"
)]
pub async fn unapprove_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ReportApproval>>, ApiError> {
    let approval = set_approval(&state, ctx, report_id, false).await?;
    Ok(ApiResponse::ok("Report approval withdrawn", approval))
}

/// Delete a report (reporter or administrator); the property status is recomputed
#[utoipa::path(
    delete,
    path = "/api/v1/property-reports/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Report UUID")
    ),
    responses(
        (status = 200, description = "Report deleted", body = ApiResponse<PropertyModel>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    tag = "property-reports"
)]
pub async fn delete_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(report_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<PropertyModel>>, ApiError> {
    let repo = PropertyReportRepository::new(&state.db);
    let report = repo.get(report_id).await?;
    ctx.require_self_or_admin(report.reporter_id)?;

    let property = repo.delete(report_id).await?;
    Ok(ApiResponse::ok("Report deleted", property))
}
