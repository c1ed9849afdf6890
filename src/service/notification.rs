//! Notification service

use std::sync::Arc;

use crate::auth::{CallerId, guard};
use crate::data::{Database, NewNotification, Notification, NotificationKind};
use crate::error::AppError;

pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Notify `user_id` about an action by `from_user_id`.
    ///
    /// Actions on one's own content produce no notification. The action
    /// that triggered it is already committed, so a failed insert is
    /// logged and reported as `None` instead of failing the request.
    pub async fn notify(
        &self,
        user_id: i64,
        from_user_id: i64,
        kind: NotificationKind,
        post_id: Option<i64>,
    ) -> Option<Notification> {
        if user_id == from_user_id {
            return None;
        }

        let result = self
            .db
            .insert_notification(&NewNotification {
                user_id,
                from_user_id,
                kind,
                post_id,
            })
            .await;

        match result {
            Ok(notification) => {
                tracing::debug!(
                    user_id,
                    from_user_id,
                    kind = kind.as_str(),
                    "Notification created"
                );
                Some(notification)
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    user_id,
                    from_user_id,
                    kind = kind.as_str(),
                    "Failed to create notification"
                );
                None
            }
        }
    }

    /// Newest first
    pub async fn list(&self, caller: CallerId, user_id: i64) -> Result<Vec<Notification>, AppError> {
        guard::authorize_account_owner(caller, user_id)?;
        self.db.get_notifications(user_id).await
    }

    /// # Returns
    /// Number of notifications that changed state
    pub async fn mark_all_read(&self, caller: CallerId, user_id: i64) -> Result<u64, AppError> {
        guard::authorize_account_owner(caller, user_id)?;
        self.db.mark_all_notifications_read(user_id).await
    }
}
