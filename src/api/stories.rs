//! Story and confession endpoints

use axum::{
    extract::State,
    response::Json,
};

use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::dto::ConfessionRequest;
use crate::auth::CallerId;
use crate::data::{Confession, Story};
use crate::error::AppError;
use crate::service::CreateStory;

/// POST /api/stories
pub async fn create_story(
    State(state): State<AppState>,
    caller: CallerId,
    ApiJson(request): ApiJson<CreateStory>,
) -> Result<Json<Story>, AppError> {
    let story = state.story_service().create(caller, request).await?;
    Ok(Json(story))
}

/// GET /api/stories/feed/:user_id
pub async fn story_feed(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Vec<Story>>, AppError> {
    let stories = state.story_service().feed(caller, user_id).await?;
    Ok(Json(stories))
}

/// POST /api/confessions
pub async fn create_confession(
    State(state): State<AppState>,
    caller: CallerId,
    ApiJson(request): ApiJson<ConfessionRequest>,
) -> Result<Json<Confession>, AppError> {
    let confession = state
        .confession_service()
        .create(caller, &request.text)
        .await?;
    Ok(Json(confession))
}

/// GET /api/confessions
pub async fn list_confessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Confession>>, AppError> {
    Ok(Json(state.confession_service().list().await?))
}
