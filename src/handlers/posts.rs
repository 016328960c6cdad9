//! # Social Feed API Handlers
//!
//! Posts are paged newest first with an opaque cursor; feedbacks are the
//! comments under a post.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiQuery, ApiResponse, MessageResponse};
use crate::auth::RequestContext;
use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::ApiError;
use crate::models::feedback::Model as FeedbackModel;
use crate::models::post::Model as PostModel;
use crate::repositories::PostRepository;
use crate::server::AppState;

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[schema(example = "The pool is closed for cleaning on Saturday.")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateFeedbackRequest {
    #[schema(example = "Thanks for the heads up!")]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// Page size, 1 to 100 (default 20)
    pub limit: Option<u64>,
    /// Cursor from the previous page's `next_cursor`
    pub cursor: Option<String>,
}

/// One page of the feed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedPageResponse {
    pub items: Vec<PostModel>,
    /// Opaque cursor for the next page, null on the last page
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

fn page_size(limit: Option<u64>) -> Result<u64, ApiError> {
    match limit {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit),
        Some(limit) => Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            format!("limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"),
        )),
    }
}

/// Publish a post
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post published", body = ApiResponse<PostModel>),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostModel>>), ApiError> {
    let post = PostRepository::new(&state.db)
        .create(ctx.user_id, &request.content)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Post published", post)))
}

/// Read the feed, newest first
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader, FeedQuery),
    responses(
        (status = 200, description = "Feed page", body = ApiResponse<FeedPageResponse>),
        (status = 400, description = "Invalid limit or cursor", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<ApiResponse<FeedPageResponse>>, ApiError> {
    let limit = page_size(query.limit)?;
    let after = query.cursor.as_deref().map(decode_cursor).transpose()?;

    let page = PostRepository::new(&state.db).feed(after, limit).await?;
    let next_cursor = page.next.as_ref().map(encode_cursor);

    Ok(ApiResponse::ok(
        "Posts retrieved",
        FeedPageResponse {
            items: page.posts,
            has_more: next_cursor.is_some(),
            next_cursor,
        },
    ))
}

/// Get a post
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Post UUID")
    ),
    responses(
        (status = 200, description = "Post", body = ApiResponse<PostModel>),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<PostModel>>, ApiError> {
    let post = PostRepository::new(&state.db).get(post_id).await?;
    Ok(ApiResponse::ok("Post retrieved", post))
}

/// Delete a post and its feedbacks (author or administrator)
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Post UUID")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = PostRepository::new(&state.db);
    let post = repo.get(post_id).await?;
    ctx.require_self_or_admin(post.author_id)?;

    repo.delete(post_id).await?;
    Ok(MessageResponse::ok("Post deleted"))
}

/// Comment on a post
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/feedbacks",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Post UUID")
    ),
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback added", body = ApiResponse<FeedbackModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn create_feedback(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(post_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FeedbackModel>>), ApiError> {
    let feedback = PostRepository::new(&state.db)
        .add_feedback(post_id, ctx.user_id, &request.content)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok("Feedback added", feedback)))
}

/// Feedbacks of a post, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/feedbacks",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Post UUID")
    ),
    responses(
        (status = 200, description = "Feedbacks", body = ApiResponse<Vec<FeedbackModel>>),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn list_feedbacks(
    State(state): State<AppState>,
    _ctx: RequestContext,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<FeedbackModel>>>, ApiError> {
    let feedbacks = PostRepository::new(&state.db).list_feedbacks(post_id).await?;
    Ok(ApiResponse::ok("Feedbacks retrieved", feedbacks))
}

/// Delete a feedback (author or administrator)
#[utoipa::path(
    delete,
    path = "/api/v1/feedbacks/{id}",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Feedback UUID")
    ),
    responses(
        (status = 200, description = "Feedback deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ApiError),
        (status = 404, description = "Feedback not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn delete_feedback(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(feedback_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = PostRepository::new(&state.db);
    let feedback = repo.get_feedback(feedback_id).await?;
    ctx.require_self_or_admin(feedback.author_id)?;

    repo.delete_feedback(feedback_id).await?;
    Ok(MessageResponse::ok("Feedback deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_bounds() {
        assert_eq!(page_size(None).unwrap(), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(1)).unwrap(), 1);
        assert_eq!(page_size(Some(100)).unwrap(), 100);
        assert!(page_size(Some(0)).is_err());
        assert!(page_size(Some(101)).is_err());
    }
}
