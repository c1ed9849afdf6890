//! Stories and anonymous confessions

use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{CallerId, guard};
use crate::data::{Confession, Database, Story};
use crate::error::AppError;
use crate::service::{IdentityStore, ModerationGate};

/// `POST /api/stories` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStory {
    pub user_id: i64,
    pub text: String,
}

fn content(text: &str, what: &str) -> Result<String, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", what)));
    }
    Ok(text.to_string())
}

pub struct StoryService {
    db: Arc<Database>,
    identity: IdentityStore,
    gate: Arc<ModerationGate>,
}

impl StoryService {
    pub fn new(db: Arc<Database>, identity: IdentityStore, gate: Arc<ModerationGate>) -> Self {
        Self { db, identity, gate }
    }

    pub async fn create(&self, caller: CallerId, request: CreateStory) -> Result<Story, AppError> {
        guard::authorize_author(caller, request.user_id)?;
        let author = self
            .identity
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown caller"))?;
        self.gate.ensure_active(&author)?;

        let text = content(&request.text, "Story")?;
        self.db.insert_story(author.id, &text).await
    }

    /// Stories by the accounts `user_id` follows, newest first
    pub async fn feed(&self, caller: CallerId, user_id: i64) -> Result<Vec<Story>, AppError> {
        guard::authorize_account_owner(caller, user_id)?;
        self.db.get_followee_stories(user_id).await
    }

    pub async fn latest(&self, account_id: i64) -> Result<Option<Story>, AppError> {
        self.identity.get(account_id).await?;
        self.db.get_latest_story(account_id).await
    }
}

/// Confessions carry no author. The caller is checked for standing
/// and then forgotten.
pub struct ConfessionService {
    db: Arc<Database>,
    identity: IdentityStore,
    gate: Arc<ModerationGate>,
}

impl ConfessionService {
    pub fn new(db: Arc<Database>, identity: IdentityStore, gate: Arc<ModerationGate>) -> Self {
        Self { db, identity, gate }
    }

    pub async fn create(&self, caller: CallerId, text: &str) -> Result<Confession, AppError> {
        let caller_id = guard::require_caller(caller)?;
        let account = self
            .identity
            .find_by_id(caller_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown caller"))?;
        self.gate.ensure_active(&account)?;

        let text = content(text, "Confession")?;
        self.db.insert_confession(&text).await
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<Confession>, AppError> {
        self.db.get_confessions().await
    }
}
