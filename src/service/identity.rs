//! Identity store
//!
//! Account records behind the read-through `AccountCache`. Every
//! mutation persists first and then writes the returned row back
//! into the cache.

use std::future::Future;
use std::sync::Arc;

use crate::auth::password::{self, PASSWORD_UNCHANGED};
use crate::data::{
    Account, AccountCache, Badge, Database, NewAccount, PrivacyPatch, ProfilePatch, now_millis,
};
use crate::error::AppError;
use crate::service::ModerationGate;

/// Avatar assigned when signup does not provide one
pub const DEFAULT_AVATAR: &str =
    "https://abs.twimg.com/sticky/default_profile_images/default_profile_400x400.png";

const DUPLICATE_USERNAME_MESSAGE: &str = "This Username already exists";
const RESERVED_USERNAME_MESSAGE: &str = "This Username is reserved";

fn required_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Signup input
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<String>,
}

/// Account store
#[derive(Clone)]
pub struct IdentityStore {
    db: Arc<Database>,
    cache: Arc<AccountCache>,
    gate: Arc<ModerationGate>,
}

impl IdentityStore {
    pub fn new(db: Arc<Database>, cache: Arc<AccountCache>, gate: Arc<ModerationGate>) -> Self {
        Self { db, cache, gate }
    }

    // =========================================================================
    // Creation & login
    // =========================================================================

    /// Register a new account
    ///
    /// # Errors
    /// `PreconditionFailed` if the username is taken (exact match) or
    /// reserved (case-insensitive match against the super-admin name)
    pub async fn create(&self, signup: Signup) -> Result<Account, AppError> {
        let name = required_text(&signup.name, "name")?;
        let username = required_text(&signup.username, "username")?;
        if signup.password.is_empty() {
            return Err(AppError::Validation("password cannot be empty".to_string()));
        }

        if self.gate.is_reserved_username(&username) {
            return Err(AppError::PreconditionFailed(
                RESERVED_USERNAME_MESSAGE.to_string(),
            ));
        }

        if self.db.get_account_by_username(&username).await?.is_some() {
            return Err(AppError::PreconditionFailed(
                DUPLICATE_USERNAME_MESSAGE.to_string(),
            ));
        }

        let password_hash = password::hash_password_blocking(signup.password).await?;
        let avatar = signup
            .avatar
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

        let account = self
            .db
            .insert_account(&NewAccount {
                display_name: name.clone(),
                name,
                username,
                password_hash,
                avatar,
                is_admin: false,
            })
            .await?;

        tracing::info!(account_id = account.id, username = %account.username, "Account created");
        Ok(self.remember(account).await)
    }

    /// Create the reserved super-admin account if it does not exist yet.
    ///
    /// Does nothing when no bootstrap password is configured.
    pub async fn ensure_super_admin(
        &self,
        password: Option<&str>,
        display_name: &str,
    ) -> Result<(), AppError> {
        let username = self.gate.super_admin_username().to_string();
        if self.db.get_account_by_username(&username).await?.is_some() {
            tracing::debug!(%username, "Super-admin account already exists");
            return Ok(());
        }

        let Some(password) = password else {
            tracing::warn!(%username, "No admin password configured; super-admin account not created");
            return Ok(());
        };

        let password_hash = password::hash_password_blocking(password.to_string()).await?;
        let account = self
            .db
            .insert_account(&NewAccount {
                name: display_name.to_string(),
                username,
                password_hash,
                display_name: display_name.to_string(),
                avatar: DEFAULT_AVATAR.to_string(),
                is_admin: true,
            })
            .await?;

        tracing::info!(account_id = account.id, "Super-admin account created");
        self.remember(account).await;
        Ok(())
    }

    /// Exact username match plus password verification
    pub async fn login(&self, username: &str, password: &str) -> Result<Account, AppError> {
        let Some(account) = self.find_by_username(username).await? else {
            return Err(AppError::InvalidCredentials);
        };

        let valid = password::verify_password_blocking(
            password.to_string(),
            account.password_hash.clone(),
        )
        .await?;

        if !valid {
            tracing::debug!(account_id = account.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(account)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Cache first, then the database (populating the cache)
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Arc<Account>>, AppError> {
        if let Some(account) = self.cache.get(id).await {
            return Ok(Some(account));
        }

        // A fill must not overwrite a row written while the read was in flight
        let _guard = self.cache.write_guard().await;
        if let Some(account) = self.cache.get(id).await {
            return Ok(Some(account));
        }

        match self.db.get_account(id).await? {
            Some(account) => Ok(Some(self.cache.insert(account).await)),
            None => Ok(None),
        }
    }

    /// Like `find_by_id` but a missing account is `NotFound`
    pub async fn get(&self, id: i64) -> Result<Arc<Account>, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Account"))
    }

    /// Exact, case-sensitive match
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        self.db.get_account_by_username(username).await
    }

    pub async fn all(&self) -> Result<Vec<Account>, AppError> {
        self.db.get_all_accounts().await
    }

    pub async fn follower_ids(&self, id: i64) -> Result<Vec<i64>, AppError> {
        self.db.get_follower_ids(id).await
    }

    pub async fn following_ids(&self, id: i64) -> Result<Vec<i64>, AppError> {
        self.db.get_following_ids(id).await
    }

    pub async fn follower_count(&self, id: i64) -> Result<i64, AppError> {
        self.db.count_followers(id).await
    }

    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        self.db.is_following(follower_id, followee_id).await
    }

    /// # Returns
    /// `true` if the follower now follows the followee
    pub async fn toggle_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        self.db.toggle_follow(follower_id, followee_id).await
    }

    // =========================================================================
    // Owner updates
    // =========================================================================

    /// Apply a validated profile patch. A renamed username must be
    /// free and not reserved.
    pub async fn update_profile(&self, id: i64, patch: ProfilePatch) -> Result<Account, AppError> {
        let mut patch = patch;
        if let Some(username) = patch.username.take() {
            let username = required_text(&username, "username")?;
            if self.gate.is_reserved_username(&username) {
                return Err(AppError::PreconditionFailed(
                    RESERVED_USERNAME_MESSAGE.to_string(),
                ));
            }
            if let Some(existing) = self.db.get_account_by_username(&username).await? {
                if existing.id != id {
                    return Err(AppError::PreconditionFailed(
                        DUPLICATE_USERNAME_MESSAGE.to_string(),
                    ));
                }
            }
            patch.username = Some(username);
        }

        if let Some(display_name) = patch.display_name.take() {
            patch.display_name = Some(required_text(&display_name, "display name")?);
        }

        self.persist(self.db.patch_account_profile(id, &patch)).await
    }

    pub async fn update_privacy(&self, id: i64, patch: PrivacyPatch) -> Result<Account, AppError> {
        self.persist(self.db.patch_account_privacy(id, &patch)).await
    }

    /// Re-hash and store a new password. The `"hashed"` sentinel leaves
    /// the stored hash untouched.
    pub async fn change_password(&self, id: i64, new_password: String) -> Result<Account, AppError> {
        if new_password == PASSWORD_UNCHANGED {
            tracing::debug!(account_id = id, "Password sentinel received; hash unchanged");
            let account = self.get(id).await?;
            return Ok(account.as_ref().clone());
        }

        let password_hash = password::hash_password_blocking(new_password).await?;
        self.persist(self.db.update_password_hash(id, &password_hash)).await
    }

    /// Record activity; `None` means now
    pub async fn heartbeat(&self, id: i64, last_online: Option<i64>) -> Result<Account, AppError> {
        let last_online = last_online.filter(|t| *t > 0).unwrap_or_else(now_millis);
        self.persist(self.db.update_last_online(id, last_online)).await
    }

    pub async fn mark_verification_requested(&self, id: i64) -> Result<Account, AppError> {
        self.persist(self.db.set_verification_requested(id)).await
    }

    // =========================================================================
    // Moderation updates
    // =========================================================================

    pub async fn decide_verification(&self, id: i64, approved: bool) -> Result<Account, AppError> {
        self.persist(self.db.decide_verification(id, approved)).await
    }

    pub async fn toggle_suspension(&self, id: i64) -> Result<Account, AppError> {
        self.persist(self.db.toggle_suspension(id)).await
    }

    pub async fn toggle_admin(&self, id: i64) -> Result<Account, AppError> {
        self.persist(self.db.toggle_admin(id)).await
    }

    /// Assign a badge; `issued_by` is cleared along with the badge
    pub async fn set_badge(&self, id: i64, badge: Badge, issued_by: &str) -> Result<Account, AppError> {
        let issued_by = (badge != Badge::None).then_some(issued_by);
        self.persist(self.db.set_badge(id, badge, issued_by)).await
    }

    /// Append synthetic followers
    ///
    /// # Returns
    /// The follower count afterwards
    pub async fn grant_followers(&self, id: i64, count: u64) -> Result<i64, AppError> {
        self.get(id).await?;
        self.db.grant_synthetic_followers(id, count).await
    }

    async fn remember(&self, account: Account) -> Account {
        self.cache.insert(account).await.as_ref().clone()
    }

    /// Run an account `UPDATE ... RETURNING *` and cache the returned row
    /// under the cache write guard
    async fn persist(
        &self,
        write: impl Future<Output = Result<Option<Account>, AppError>>,
    ) -> Result<Account, AppError> {
        let _guard = self.cache.write_guard().await;
        match write.await? {
            Some(account) => Ok(self.remember(account).await),
            None => Err(AppError::NotFound("Account")),
        }
    }
}
