//! Post, reaction and comment endpoints

use axum::{
    extract::State,
    response::Json,
};

use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::dto::SuccessResponse;
use crate::auth::CallerId;
use crate::data::{Comment, ReactionKind};
use crate::error::AppError;
use crate::service::{CreateComment, CreatePost, PostView};

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostView>>, AppError> {
    Ok(Json(state.post_service().list().await?))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    caller: CallerId,
    ApiJson(request): ApiJson<CreatePost>,
) -> Result<Json<PostView>, AppError> {
    let post = state.post_service().create(caller, request).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.post_service().delete(caller, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/posts/:id/like
pub async fn toggle_like(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PostView>, AppError> {
    let post = state
        .post_service()
        .toggle_reaction(caller, id, ReactionKind::Like)
        .await?;
    Ok(Json(post))
}

/// POST /api/posts/:id/retweet
pub async fn toggle_retweet(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PostView>, AppError> {
    let post = state
        .post_service()
        .toggle_reaction(caller, id, ReactionKind::Retweet)
        .await?;
    Ok(Json(post))
}

/// POST /api/posts/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<CreateComment>,
) -> Result<Json<Comment>, AppError> {
    let comment = state.post_service().add_comment(caller, id, request).await?;
    Ok(Json(comment))
}

/// DELETE /api/posts/:id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath((post_id, comment_id)): ApiPath<(i64, i64)>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .post_service()
        .delete_comment(caller, post_id, comment_id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
