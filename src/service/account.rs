//! Account service
//!
//! The account-update path: every change to an account arrives as a
//! typed `AccountCommand`. Self commands require the caller to be the
//! target; moderation commands are checked against the caller's role.

use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{CallerId, guard};
use crate::data::{Account, Badge, NotificationKind, PrivacyPatch, ProfilePatch};
use crate::error::AppError;
use crate::metrics::MODERATION_ACTIONS_TOTAL;
use crate::service::moderation::VerificationRequest;
use crate::service::{IdentityStore, ModerationGate, NotificationService};

/// A single account mutation, tagged by `action`
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum AccountCommand {
    UpdateProfile {
        display_name: Option<String>,
        username: Option<String>,
        bio: Option<String>,
        avatar: Option<String>,
    },
    UpdatePrivacy(PrivacyPatch),
    ChangePassword {
        password: String,
    },
    Heartbeat {
        last_online: Option<i64>,
    },
    RequestVerification,
    ToggleSuspension,
    ApproveVerification,
    DenyVerification,
    AssignBadge {
        badge: Badge,
    },
    ToggleAdmin,
    GrantFollowers {
        count: i64,
    },
}

impl AccountCommand {
    /// Label used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateProfile { .. } => "update_profile",
            Self::UpdatePrivacy(_) => "update_privacy",
            Self::ChangePassword { .. } => "change_password",
            Self::Heartbeat { .. } => "heartbeat",
            Self::RequestVerification => "request_verification",
            Self::ToggleSuspension => "toggle_suspension",
            Self::ApproveVerification => "approve_verification",
            Self::DenyVerification => "deny_verification",
            Self::AssignBadge { .. } => "assign_badge",
            Self::ToggleAdmin => "toggle_admin",
            Self::GrantFollowers { .. } => "grant_followers",
        }
    }
}

/// Result of an account command
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub account: Account,
    /// Set when a verification request was already outstanding
    pub already_pending: bool,
}

impl From<Account> for AccountUpdate {
    fn from(account: Account) -> Self {
        Self {
            account,
            already_pending: false,
        }
    }
}

/// Result of a follow toggle
#[derive(Debug, Clone)]
pub struct FollowToggle {
    pub following: bool,
    pub target: Account,
}

pub struct AccountService {
    identity: IdentityStore,
    gate: Arc<ModerationGate>,
    notifications: NotificationService,
}

impl AccountService {
    pub fn new(
        identity: IdentityStore,
        gate: Arc<ModerationGate>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            identity,
            gate,
            notifications,
        }
    }

    /// Apply `command` to account `target_id` on behalf of `caller`
    pub async fn apply(
        &self,
        caller: CallerId,
        target_id: i64,
        command: AccountCommand,
    ) -> Result<AccountUpdate, AppError> {
        match command {
            AccountCommand::UpdateProfile {
                display_name,
                username,
                bio,
                avatar,
            } => {
                let account = self.owner(caller, target_id).await?;
                self.gate.ensure_active(&account)?;

                let patch = ProfilePatch {
                    display_name,
                    username,
                    bio,
                    avatar,
                };
                if patch.is_empty() {
                    return Err(AppError::Validation("Nothing to update".to_string()));
                }
                Ok(self.identity.update_profile(target_id, patch).await?.into())
            }
            AccountCommand::UpdatePrivacy(patch) => {
                self.owner(caller, target_id).await?;
                Ok(self.identity.update_privacy(target_id, patch).await?.into())
            }
            AccountCommand::ChangePassword { password } => {
                self.owner(caller, target_id).await?;
                Ok(self.identity.change_password(target_id, password).await?.into())
            }
            AccountCommand::Heartbeat { last_online } => {
                self.owner(caller, target_id).await?;
                Ok(self.identity.heartbeat(target_id, last_online).await?.into())
            }
            AccountCommand::RequestVerification => {
                self.request_verification(caller, target_id).await
            }
            command => self.moderate(caller, target_id, command).await,
        }
    }

    async fn owner(&self, caller: CallerId, target_id: i64) -> Result<Arc<Account>, AppError> {
        guard::authorize_account_owner(caller, target_id)?;
        self.identity.get(target_id).await
    }

    async fn request_verification(
        &self,
        caller: CallerId,
        target_id: i64,
    ) -> Result<AccountUpdate, AppError> {
        let account = self.owner(caller, target_id).await?;
        let followers = self.identity.follower_count(target_id).await?;

        match self.gate.check_verification_request(&account, followers)? {
            VerificationRequest::AlreadyPending => Ok(AccountUpdate {
                account: account.as_ref().clone(),
                already_pending: true,
            }),
            VerificationRequest::Submit => {
                let account = self.identity.mark_verification_requested(target_id).await?;
                tracing::info!(account_id = target_id, followers, "Verification requested");
                Ok(account.into())
            }
        }
    }

    /// Admin and super-admin commands
    async fn moderate(
        &self,
        caller: CallerId,
        target_id: i64,
        command: AccountCommand,
    ) -> Result<AccountUpdate, AppError> {
        let actor_id = guard::require_caller(caller)?;
        let actor = self
            .identity
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown caller"))?;

        match &command {
            AccountCommand::AssignBadge { .. }
            | AccountCommand::ToggleAdmin
            | AccountCommand::GrantFollowers { .. } => self.gate.ensure_super_admin(&actor)?,
            _ => self.gate.ensure_admin(&actor)?,
        }

        self.identity.get(target_id).await?;
        let action = command.name();

        let account = match command {
            AccountCommand::ToggleSuspension => self.identity.toggle_suspension(target_id).await?,
            AccountCommand::ApproveVerification => {
                let account = self.identity.decide_verification(target_id, true).await?;
                self.notifications
                    .notify(target_id, actor_id, NotificationKind::VerificationApproved, None)
                    .await;
                account
            }
            AccountCommand::DenyVerification => {
                let account = self.identity.decide_verification(target_id, false).await?;
                self.notifications
                    .notify(target_id, actor_id, NotificationKind::VerificationDenied, None)
                    .await;
                account
            }
            AccountCommand::AssignBadge { badge } => {
                self.identity
                    .set_badge(target_id, badge, self.gate.super_admin_username())
                    .await?
            }
            AccountCommand::ToggleAdmin => self.identity.toggle_admin(target_id).await?,
            AccountCommand::GrantFollowers { count } => {
                let granted = self.gate.follower_grant_size(count)?;
                let total = self.identity.grant_followers(target_id, granted).await?;
                tracing::info!(target_id, granted, total, "Synthetic followers granted");
                self.identity.get(target_id).await?.as_ref().clone()
            }
            other => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "{} is not a moderation command",
                    other.name()
                )));
            }
        };

        MODERATION_ACTIONS_TOTAL.with_label_values(&[action]).inc();
        tracing::info!(actor_id, target_id, action, "Moderation action applied");

        Ok(account.into())
    }

    /// Follow `target_id` if the caller does not follow it yet,
    /// otherwise remove every follow edge between them
    pub async fn toggle_follow(
        &self,
        caller: CallerId,
        target_id: i64,
    ) -> Result<FollowToggle, AppError> {
        let follower_id = guard::require_caller(caller)?;
        if follower_id == target_id {
            return Err(AppError::Validation("You cannot follow yourself".to_string()));
        }

        self.identity
            .find_by_id(follower_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown caller"))?;
        let target = self.identity.get(target_id).await?;

        if !self.identity.is_following(follower_id, target_id).await? {
            self.gate.ensure_accepts_followers(&target)?;
        }

        let following = self.identity.toggle_follow(follower_id, target_id).await?;
        if following {
            self.notifications
                .notify(target_id, follower_id, NotificationKind::Follow, None)
                .await;
        }

        tracing::debug!(follower_id, target_id, following, "Follow toggled");
        Ok(FollowToggle {
            following,
            target: target.as_ref().clone(),
        })
    }
}
