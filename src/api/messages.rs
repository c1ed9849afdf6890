//! Direct message endpoints

use axum::{
    extract::State,
    response::Json,
};

use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::dto::{MarkedReadResponse, SuccessResponse};
use crate::auth::CallerId;
use crate::data::Message;
use crate::error::AppError;
use crate::service::{ConversationSummary, SendMessage};

/// GET /api/messages/:user_id
pub async fn get_conversations(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    let conversations = state
        .messaging_service()
        .conversations(caller, user_id)
        .await?;
    Ok(Json(conversations))
}

/// GET /api/messages/:user_id/:other_user_id
pub async fn get_conversation(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath((user_id, other_user_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state
        .messaging_service()
        .history(caller, user_id, other_user_id)
        .await?;
    Ok(Json(messages))
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    caller: CallerId,
    ApiJson(request): ApiJson<SendMessage>,
) -> Result<Json<Message>, AppError> {
    let message = state.messaging_service().send(caller, request).await?;
    Ok(Json(message))
}

/// DELETE /api/messages/:id
pub async fn delete_message(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.messaging_service().delete(caller, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/messages/:user_id/:other_user_id/read
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath((user_id, other_user_id)): ApiPath<(i64, i64)>,
) -> Result<Json<MarkedReadResponse>, AppError> {
    let updated = state
        .messaging_service()
        .mark_read(caller, user_id, other_user_id)
        .await?;
    Ok(Json(MarkedReadResponse { updated }))
}
