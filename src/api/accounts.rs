//! Account endpoints

use axum::{
    extract::State,
    response::Json,
};

use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::account_to_response;
use crate::api::dto::{
    AccountResponse, AccountUpdateResponse, FollowResponse, LoginRequest, SignupRequest,
};
use crate::auth::CallerId;
use crate::data::{Account, Story};
use crate::error::AppError;
use crate::service::{AccountCommand, IdentityStore, Signup};

async fn account_response(
    identity: &IdentityStore,
    account: &Account,
) -> Result<AccountResponse, AppError> {
    let followers = identity.follower_ids(account.id).await?;
    let following = identity.following_ids(account.id).await?;
    Ok(account_to_response(account, followers, following))
}

/// GET /api/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let identity = state.identity();
    let accounts = identity.all().await?;

    let mut responses = Vec::with_capacity(accounts.len());
    for account in &accounts {
        responses.push(account_response(&identity, account).await?);
    }

    Ok(Json(responses))
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let identity = state.identity();
    let account = identity
        .create(Signup {
            name: request.name,
            username: request.username,
            password: request.password,
            avatar: request.avatar,
        })
        .await?;

    Ok(Json(account_response(&identity, &account).await?))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let identity = state.identity();
    let account = identity.login(&request.username, &request.password).await?;

    tracing::info!(account_id = account.id, "Login succeeded");
    Ok(Json(account_response(&identity, &account).await?))
}

/// GET /api/accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let identity = state.identity();
    let account = identity.get(id).await?;

    Ok(Json(account_response(&identity, &account).await?))
}

/// PUT /api/accounts/:id
///
/// Body is a tagged `AccountCommand`, e.g. `{"action": "toggleSuspension"}`.
/// Unknown actions and malformed fields are validation errors.
pub async fn update_account(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
    ApiJson(command): ApiJson<AccountCommand>,
) -> Result<Json<AccountUpdateResponse>, AppError> {
    let update = state.account_service().apply(caller, id, command).await?;

    let account = account_response(&state.identity(), &update.account).await?;
    Ok(Json(AccountUpdateResponse {
        account,
        already_pending: update.already_pending,
    }))
}

/// POST /api/accounts/:id/follow
pub async fn toggle_follow(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<FollowResponse>, AppError> {
    let toggle = state.account_service().toggle_follow(caller, id).await?;

    let account = account_response(&state.identity(), &toggle.target).await?;
    Ok(Json(FollowResponse {
        following: toggle.following,
        account,
    }))
}

/// GET /api/accounts/:id/story
pub async fn latest_story(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<Story>>, AppError> {
    let story = state.story_service().latest(id).await?;
    Ok(Json(story))
}
