//! # Direct Messaging API Handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiJson, ApiPath, ApiResponse};
use crate::auth::RequestContext;
use crate::error::{ApiError, forbidden};
use crate::models::chat::Model as ChatModel;
use crate::models::message::Model as MessageModel;
use crate::repositories::ChatRepository;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenChatRequest {
    /// The other participant
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[schema(example = "Is the parking spot still available?")]
    pub content: String,
}

async fn participant_chat(
    repo: &ChatRepository<'_>,
    ctx: &RequestContext,
    chat_id: Uuid,
) -> Result<ChatModel, ApiError> {
    let chat = repo.get(chat_id).await?;
    if !chat.has_participant(ctx.user_id) {
        return Err(forbidden(Some("Only chat participants may access messages")));
    }
    Ok(chat)
}

/// Open (or return the existing) chat with another user
#[utoipa::path(
    post,
    path = "/api/v1/chats",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    request_body = OpenChatRequest,
    responses(
        (status = 200, description = "Chat", body = ApiResponse<ChatModel>),
        (status = 400, description = "Cannot chat with yourself", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "chats"
)]
pub async fn open_chat(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<OpenChatRequest>,
) -> Result<Json<ApiResponse<ChatModel>>, ApiError> {
    let chat = ChatRepository::new(&state.db)
        .open(ctx.user_id, request.user_id)
        .await?;

    Ok(ApiResponse::ok("Chat ready", chat))
}

/// Chats of the acting user
#[utoipa::path(
    get,
    path = "/api/v1/chats",
    security(("bearer_auth" = [])),
    params(crate::auth::UserHeader),
    responses(
        (status = 200, description = "Chats", body = ApiResponse<Vec<ChatModel>>)
    ),
    tag = "chats"
)]
pub async fn list_chats(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<ChatModel>>>, ApiError> {
    let chats = ChatRepository::new(&state.db)
        .list_for_user(ctx.user_id)
        .await?;

    Ok(ApiResponse::ok("Chats retrieved", chats))
}

/// Send a message (participants only)
#[utoipa::path(
    post,
    path = "/api/v1/chats/{id}/messages",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Chat UUID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<MessageModel>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Not a participant", body = ApiError),
        (status = 404, description = "Chat not found", body = ApiError)
    ),
    tag = "chats"
)]
pub async fn send_message(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(chat_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageModel>>), ApiError> {
    let repo = ChatRepository::new(&state.db);
    let chat = participant_chat(&repo, &ctx, chat_id).await?;

    let message = repo.send(chat.id, ctx.user_id, &request.content).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Message sent", message)))
}

/// Messages of a chat, oldest first (participants only)
#[utoipa::path(
    get,
    path = "/api/v1/chats/{id}/messages",
    security(("bearer_auth" = [])),
    params(
        crate::auth::UserHeader,
        ("id" = Uuid, Path, description = "Chat UUID")
    ),
    responses(
        (status = 200, description = "Messages", body = ApiResponse<Vec<MessageModel>>),
        (status = 403, description = "Not a participant", body = ApiError),
        (status = 404, description = "Chat not found", body = ApiError)
    ),
    tag = "chats"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(chat_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<MessageModel>>>, ApiError> {
    let repo = ChatRepository::new(&state.db);
    let chat = participant_chat(&repo, &ctx, chat_id).await?;

    let messages = repo.messages(chat.id).await?;
    Ok(ApiResponse::ok("Messages retrieved", messages))
}
