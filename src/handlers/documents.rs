//! # Documents API Handlers
//!
//! Per-user PDF storage. Uploads are raw `application/pdf` request bodies.

use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;

use super::types::{ApiPath, ApiResponse, MessageResponse};
use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::server::AppState;
use crate::storage::DocumentInfo;

fn require_pdf_content_type(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if mime.eq_ignore_ascii_case("application/pdf") {
        Ok(())
    } else {
        Err(ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "Documents must be uploaded with Content-Type: application/pdf",
        ))
    }
}

async fn authorize_owner(
    state: &AppState,
    ctx: &RequestContext,
    user_id: Uuid,
) -> Result<(), ApiError> {
    ctx.require_self_or_admin(user_id)?;
    UserRepository::new(&state.db).get(user_id).await?;
    Ok(())
}

/// List a user's documents (owner or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/documents",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "Documents", body = ApiResponse<Vec<DocumentInfo>>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<DocumentInfo>>>, ApiError> {
    authorize_owner(&state, &ctx, user_id).await?;

    let documents = state.documents.list(user_id).await?;
    Ok(ApiResponse::ok("Documents retrieved", documents))
}

/// Upload or replace a PDF document (owner or administrator)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/documents/{file_name}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID"),
        ("file_name" = String, Path, description = "File name, `[A-Za-z0-9._-]` ending in .pdf")
    ),
    request_body(content = Vec<u8>, content_type = "application/pdf"),
    responses(
        (status = 201, description = "Document stored", body = ApiResponse<DocumentInfo>),
        (status = 400, description = "Invalid file name or not a PDF", body = ApiError),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 413, description = "Document too large", body = ApiError),
        (status = 415, description = "Wrong content type", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath((user_id, file_name)): ApiPath<(Uuid, String)>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentInfo>>), ApiError> {
    authorize_owner(&state, &ctx, user_id).await?;
    require_pdf_content_type(&headers)?;
    let body = body.map_err(|rejection| {
        let code = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            "PAYLOAD_TOO_LARGE"
        } else {
            "VALIDATION_FAILED"
        };
        ApiError::new(rejection.status(), code, rejection.body_text())
    })?;

    let info = state.documents.put(user_id, &file_name, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Document stored", info)))
}

/// Download a PDF document (owner or administrator)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/documents/{file_name}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID"),
        ("file_name" = String, Path, description = "Document file name")
    ),
    responses(
        (status = 200, description = "PDF content", content_type = "application/pdf", body = Vec<u8>),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Document not found", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn download_document(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath((user_id, file_name)): ApiPath<(Uuid, String)>,
) -> Result<Response, ApiError> {
    authorize_owner(&state, &ctx, user_id).await?;

    let document = state.documents.get(user_id, &file_name).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    if let Some(etag) = document
        .info
        .etag
        .as_deref()
        .and_then(|etag| HeaderValue::from_str(&format!("\"{etag}\"")).ok())
    {
        headers.insert(header::ETAG, etag);
    }
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("inline; filename=\"{}\"", document.info.file_name))
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((StatusCode::OK, headers, document.bytes).into_response())
}

/// Delete a document (owner or administrator)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/documents/{file_name}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "User UUID"),
        ("file_name" = String, Path, description = "Document file name")
    ),
    responses(
        (status = 200, description = "Document deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Document not found", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath((user_id, file_name)): ApiPath<(Uuid, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize_owner(&state, &ctx, user_id).await?;

    state.documents.delete(user_id, &file_name).await?;
    Ok(MessageResponse::ok("Document deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_check() {
        let mut headers = HeaderMap::new();
        assert!(require_pdf_content_type(&headers).is_err());

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(require_pdf_content_type(&headers).is_err());

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/pdf; charset=binary"),
        );
        assert!(require_pdf_content_type(&headers).is_ok());
    }
}
