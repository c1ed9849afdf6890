//! Notification endpoints

use axum::{
    extract::State,
    response::Json,
};

use crate::AppState;
use crate::api::extract::ApiPath;
use crate::api::dto::MarkedReadResponse;
use crate::auth::CallerId;
use crate::data::Notification;
use crate::error::AppError;

/// GET /api/notifications/:user_id
pub async fn get_notifications(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.notification_service().list(caller, user_id).await?;
    Ok(Json(notifications))
}

/// POST /api/notifications/:user_id/read
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<MarkedReadResponse>, AppError> {
    let updated = state
        .notification_service()
        .mark_all_read(caller, user_id)
        .await?;
    Ok(Json(MarkedReadResponse { updated }))
}
