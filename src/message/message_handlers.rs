use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    message::{
        message_dto::{
            ConversationSummary, PaginatedResponse, SendMessageRequest, UnreadCountResponse,
        },
        message_models::MessageResponse,
    },
    middleware::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

/// Send a message to another user
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent successfully", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let message = state
        .message_service
        .send_message(user_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Get conversation messages with a specific user
#[utoipa::path(
    get,
    path = "/api/messages/with/{user_id}",
    tag = "messages",
    params(
        ("user_id" = Uuid, Path, description = "Other user ID to get conversation with"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 50)")
    ),
    responses(
        (status = 200, description = "Paginated conversation messages", body = PaginatedResponse<MessageResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Message store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(other_user_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    // i64 so a huge page number can't overflow
    let offset = (i64::from(page) - 1) * i64::from(limit);

    let (messages, total) = state
        .message_service
        .get_conversation_with_count(user_id, other_user_id, i64::from(limit), offset)
        .await?;

    // Opening a thread marks the other side's messages read
    if let Err(e) = state
        .message_service
        .mark_conversation_as_read(user_id, other_user_id)
        .await
    {
        tracing::warn!("Failed to mark conversation with {} as read: {}", other_user_id, e);
    }

    let message_responses: Vec<MessageResponse> = messages
        .into_iter()
        .map(MessageResponse::from)
        .collect();

    let total_pages = ((total as f64) / (limit as f64)).ceil() as u32;

    let response = PaginatedResponse {
        data: message_responses,
        total,
        page,
        limit,
        total_pages,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Get all conversations for the authenticated user
#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    tag = "messages",
    responses(
        (status = 200, description = "List of conversations, most recent first", body = Vec<ConversationSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Message store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let conversations = state
        .message_service
        .get_conversations(user_id)
        .await?;

    Ok((StatusCode::OK, Json(conversations)))
}

/// Get the total unread message count for the authenticated user
#[utoipa::path(
    get,
    path = "/api/messages/unread-count",
    tag = "messages",
    responses(
        (status = 200, description = "Unread message count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Message store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let unread_count = state.message_service.count_unread(user_id).await?;

    Ok((StatusCode::OK, Json(UnreadCountResponse { unread_count })))
}

/// Mark a message as read
#[utoipa::path(
    patch,
    path = "/api/messages/{id}/read",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Message ID to mark as read")
    ),
    responses(
        (status = 200, description = "Message marked as read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Message not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    if message_id.is_nil() {
        return Err(AppError::InvalidInput("Message id is required".to_string()));
    }

    state
        .message_service
        .mark_read(user_id, message_id)
        .await?;

    Ok(StatusCode::OK)
}
