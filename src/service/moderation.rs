//! Moderation gate
//!
//! Decides whether an account's standing allows an action:
//! suspension blocks content-producing actions, admin actions need
//! the admin flag or the reserved super-admin username, and a few
//! actions are reserved for the super-admin alone.

use crate::config::ModerationConfig;
use crate::data::Account;
use crate::error::{AppError, ForbiddenReason};

/// Result of a verification request that passed the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationRequest {
    /// Request should be recorded
    Submit,
    /// A request is already outstanding; nothing to do
    AlreadyPending,
}

/// Moderation rules derived from configuration
#[derive(Debug, Clone)]
pub struct ModerationGate {
    super_admin_username: String,
    verification_follower_threshold: u64,
    follower_grant_batch_limit: u64,
}

impl ModerationGate {
    pub fn new(config: &ModerationConfig) -> Self {
        Self {
            super_admin_username: config.super_admin_username.trim().to_string(),
            verification_follower_threshold: config.verification_follower_threshold,
            follower_grant_batch_limit: config.follower_grant_batch_limit,
        }
    }

    pub fn super_admin_username(&self) -> &str {
        &self.super_admin_username
    }

    /// Case-insensitive comparison against the reserved name.
    ///
    /// Username uniqueness stays case-sensitive; the two rules are independent.
    pub fn is_reserved_username(&self, username: &str) -> bool {
        username.eq_ignore_ascii_case(&self.super_admin_username)
    }

    pub fn is_super_admin(&self, account: &Account) -> bool {
        self.is_reserved_username(&account.username)
    }

    pub fn is_admin(&self, account: &Account) -> bool {
        account.is_admin || self.is_super_admin(account)
    }

    /// Content-producing actions require an account that is not suspended
    pub fn ensure_active(&self, account: &Account) -> Result<(), AppError> {
        if account.is_suspended {
            tracing::warn!(account_id = account.id, "Suspended account attempted an action");
            return Err(AppError::Forbidden(ForbiddenReason::Suspended));
        }
        Ok(())
    }

    /// Suspension, verification decisions
    pub fn ensure_admin(&self, actor: &Account) -> Result<(), AppError> {
        if self.is_admin(actor) {
            return Ok(());
        }
        tracing::warn!(account_id = actor.id, "Admin action refused");
        Err(AppError::Forbidden(ForbiddenReason::InsufficientPrivilege))
    }

    /// Badges, admin flag, follower grants
    pub fn ensure_super_admin(&self, actor: &Account) -> Result<(), AppError> {
        if self.is_super_admin(actor) {
            return Ok(());
        }
        tracing::warn!(account_id = actor.id, "Super-admin action refused");
        Err(AppError::Forbidden(ForbiddenReason::InsufficientPrivilege))
    }

    pub fn ensure_accepts_messages(&self, receiver: &Account) -> Result<(), AppError> {
        if receiver.allow_direct_messages {
            return Ok(());
        }
        Err(AppError::Forbidden(ForbiddenReason::DirectMessagesDisabled))
    }

    pub fn ensure_accepts_followers(&self, target: &Account) -> Result<(), AppError> {
        if target.allow_follow_requests {
            return Ok(());
        }
        Err(AppError::Forbidden(ForbiddenReason::FollowRequestsDisabled))
    }

    /// Check a verification request against the follower threshold
    ///
    /// # Errors
    /// `PreconditionFailed` when the account has fewer followers than required
    pub fn check_verification_request(
        &self,
        account: &Account,
        follower_count: i64,
    ) -> Result<VerificationRequest, AppError> {
        let follower_count = follower_count.max(0) as u64;
        if follower_count < self.verification_follower_threshold {
            return Err(AppError::PreconditionFailed(format!(
                "You need {} followers to request verification. You currently have {} followers.",
                self.verification_follower_threshold, follower_count
            )));
        }

        if account.verification_requested {
            return Ok(VerificationRequest::AlreadyPending);
        }

        Ok(VerificationRequest::Submit)
    }

    /// Number of synthetic followers a grant of `requested` adds
    pub fn follower_grant_size(&self, requested: i64) -> Result<u64, AppError> {
        if requested <= 0 {
            return Err(AppError::Validation(
                "Please enter a valid number of followers".to_string(),
            ));
        }
        Ok((requested as u64).min(self.follower_grant_batch_limit))
    }
}
