//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx runtime queries with `FromRow` mapping.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tokio::sync::Mutex;

use super::models::*;
use crate::error::AppError;

const DUPLICATE_USERNAME_MESSAGE: &str = "This Username already exists";

fn map_username_conflict(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::PreconditionFailed(DUPLICATE_USERNAME_MESSAGE.to_string())
        }
        _ => AppError::Database(error),
    }
}

/// Database connection pool wrapper.
///
/// Multi-statement writes (toggles, follower grants, cascading deletes)
/// hold `write_lock` for their whole transaction so that concurrent
/// writers are applied one after another instead of racing.
pub struct Database {
    pool: Pool<Sqlite>,
    write_lock: Mutex<()>,
}

impl Database {
    /// Open (or create) the SQLite file at `path` and run migrations
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::from(e)
        })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    ///
    /// # Errors
    /// `PreconditionFailed` if the username is already taken (exact match)
    pub async fn insert_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        let now = now_millis();
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO account (
                name, username, password_hash, display_name, bio, avatar,
                is_admin, last_online, created_at
            ) VALUES (?, ?, ?, ?, '', ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&account.name)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(&account.avatar)
        .bind(account.is_admin)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_username_conflict)
    }

    pub async fn get_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM account WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Exact, case-sensitive username lookup
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM account WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    pub async fn get_all_accounts(&self) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>("SELECT * FROM account ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// Apply a profile patch. Returns `None` if the account does not exist.
    pub async fn patch_account_profile(
        &self,
        id: i64,
        patch: &ProfilePatch,
    ) -> Result<Option<Account>, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE account SET
                display_name = COALESCE(?, display_name),
                username = COALESCE(?, username),
                bio = COALESCE(?, bio),
                avatar = COALESCE(?, avatar),
                last_online = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&patch.display_name)
        .bind(&patch.username)
        .bind(&patch.bio)
        .bind(&patch.avatar)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_username_conflict)
    }

    pub async fn patch_account_privacy(
        &self,
        id: i64,
        patch: &PrivacyPatch,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE account SET
                allow_follow_requests = COALESCE(?, allow_follow_requests),
                allow_direct_messages = COALESCE(?, allow_direct_messages),
                show_activity = COALESCE(?, show_activity),
                show_last_online = COALESCE(?, show_last_online)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(patch.allow_follow_requests)
        .bind(patch.allow_direct_messages)
        .bind(patch.show_activity)
        .bind(patch.show_last_online)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn update_password_hash(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE account SET password_hash = ? WHERE id = ? RETURNING *",
        )
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn update_last_online(
        &self,
        id: i64,
        last_online: i64,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE account SET last_online = ? WHERE id = ? RETURNING *",
        )
        .bind(last_online)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn set_verification_requested(&self, id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE account SET verification_requested = 1 WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Record an admin's verification decision; always clears the pending request.
    pub async fn decide_verification(
        &self,
        id: i64,
        approved: bool,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE account SET
                verified_id = CASE WHEN ? THEN 1 ELSE verified_id END,
                verification_requested = 0
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(approved)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn toggle_suspension(&self, id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE account SET is_suspended = NOT is_suspended WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn toggle_admin(&self, id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE account SET is_admin = NOT is_admin WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn set_badge(
        &self,
        id: i64,
        badge: Badge,
        issued_by: Option<&str>,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE account SET badge = ?, badge_issued_by = ? WHERE id = ? RETURNING *",
        )
        .bind(badge.as_column())
        .bind(issued_by)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    // =========================================================================
    // Follow relationships
    // =========================================================================

    /// Follower ids of an account in insertion order (duplicates preserved)
    pub async fn get_follower_ids(&self, account_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT follower_id FROM follow WHERE followee_id = ? ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Ids the account follows in insertion order
    pub async fn get_following_ids(&self, account_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT followee_id FROM follow WHERE follower_id = ? ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn count_followers(&self, account_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follow WHERE followee_id = ?")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM follow WHERE follower_id = ? AND followee_id = ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Follow if not following, otherwise remove every matching edge.
    ///
    /// # Returns
    /// `true` if an edge was added, `false` if edges were removed
    pub async fn toggle_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM follow WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let followed = removed == 0;
        if followed {
            sqlx::query("INSERT INTO follow (follower_id, followee_id, created_at) VALUES (?, ?, ?)")
                .bind(follower_id)
                .bind(followee_id)
                .bind(now_millis())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(followed)
    }

    /// Append `count` synthetic followers with descending negative ids.
    ///
    /// Ids start one below the smallest existing follower id (or zero).
    ///
    /// # Returns
    /// The account's follower count afterwards
    pub async fn grant_synthetic_followers(
        &self,
        account_id: i64,
        count: u64,
    ) -> Result<i64, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let min_existing = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MIN(follower_id) FROM follow WHERE followee_id = ?",
        )
        .bind(account_id)
        .fetch_one(&mut *tx)
        .await?;

        let start = min_existing.unwrap_or(0).min(0) - 1;
        let now = now_millis();
        for offset in 0..count as i64 {
            sqlx::query("INSERT INTO follow (follower_id, followee_id, created_at) VALUES (?, ?, ?)")
                .bind(start - offset)
                .bind(account_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follow WHERE followee_id = ?")
                .bind(account_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(total)
    }

    // =========================================================================
    // Direct messages
    // =========================================================================

    /// Append a message to the log
    pub async fn insert_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO message (sender_id, receiver_id, text, timestamp, read)
            VALUES (?, ?, ?, ?, 0)
            RETURNING *
            "#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.text)
        .bind(message.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn get_message(&self, id: i64) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM message WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(message)
    }

    /// Every message the user sent or received, in id order
    pub async fn get_messages_involving(&self, user_id: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM message WHERE sender_id = ? OR receiver_id = ? ORDER BY id",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Messages exchanged between `a` and `b`, oldest first (ties by id)
    pub async fn get_messages_between(&self, a: i64, b: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM message
            WHERE (sender_id = ? AND receiver_id = ?)
               OR (sender_id = ? AND receiver_id = ?)
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// # Returns
    /// `true` if a message was deleted
    pub async fn delete_message(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM message WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_messages(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM message")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Mark messages from `sender_id` to `receiver_id` as read
    ///
    /// # Returns
    /// Number of messages that changed state
    pub async fn mark_messages_read(
        &self,
        receiver_id: i64,
        sender_id: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE message SET read = 1 WHERE receiver_id = ? AND sender_id = ? AND read = 0",
        )
        .bind(receiver_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    pub async fn insert_post(&self, post: &NewPost) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO post (user_id, text, image, mood, location, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(post.user_id)
        .bind(&post.text)
        .bind(&post.image)
        .bind(&post.mood)
        .bind(&post.location)
        .bind(post.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// All posts, newest first
    pub async fn get_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts =
            sqlx::query_as::<_, Post>("SELECT * FROM post ORDER BY timestamp DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(posts)
    }

    /// Delete a post together with its reactions and comments
    pub async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM post_reaction WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comment WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add the reaction if absent, remove it otherwise
    ///
    /// # Returns
    /// `true` if the reaction is now present
    pub async fn toggle_reaction(
        &self,
        post_id: i64,
        account_id: i64,
        kind: ReactionKind,
    ) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM post_reaction WHERE post_id = ? AND account_id = ? AND kind = ?",
        )
        .bind(post_id)
        .bind(account_id)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let added = removed == 0;
        if added {
            sqlx::query(
                "INSERT INTO post_reaction (post_id, account_id, kind, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(post_id)
            .bind(account_id)
            .bind(kind.as_str())
            .bind(now_millis())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(added)
    }

    pub async fn get_reactions(&self, post_id: i64) -> Result<Vec<Reaction>, AppError> {
        let reactions = sqlx::query_as::<_, Reaction>(
            "SELECT post_id, account_id, kind FROM post_reaction WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reactions)
    }

    pub async fn get_all_reactions(&self) -> Result<Vec<Reaction>, AppError> {
        let reactions = sqlx::query_as::<_, Reaction>(
            "SELECT post_id, account_id, kind FROM post_reaction ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(reactions)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(
        &self,
        post_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (post_id, user_id, text, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Comment `comment_id` if it belongs to `post_id`
    pub async fn get_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, AppError> {
        let comment =
            sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = ? AND post_id = ?")
                .bind(comment_id)
                .bind(post_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(comment)
    }

    pub async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments =
            sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE post_id = ? ORDER BY id")
                .bind(post_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(comments)
    }

    pub async fn get_all_comments(&self) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>("SELECT * FROM comment ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    pub async fn delete_comment(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comment WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notification (user_id, from_user_id, kind, post_id, read, timestamp)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.from_user_id)
        .bind(notification.kind.as_str())
        .bind(notification.post_id)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Notifications for a user, newest first
    pub async fn get_notifications(&self, user_id: i64) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notification WHERE user_id = ? ORDER BY timestamp DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE notification SET read = 1 WHERE user_id = ? AND read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Stories
    // =========================================================================

    pub async fn insert_story(&self, user_id: i64, text: &str) -> Result<Story, AppError> {
        let story = sqlx::query_as::<_, Story>(
            "INSERT INTO story (user_id, text, timestamp) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(text)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(story)
    }

    pub async fn get_latest_story(&self, user_id: i64) -> Result<Option<Story>, AppError> {
        let story = sqlx::query_as::<_, Story>(
            "SELECT * FROM story WHERE user_id = ? ORDER BY timestamp DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(story)
    }

    /// Stories written by accounts `user_id` follows, newest first
    pub async fn get_followee_stories(&self, user_id: i64) -> Result<Vec<Story>, AppError> {
        let stories = sqlx::query_as::<_, Story>(
            r#"
            SELECT * FROM story
            WHERE user_id IN (SELECT followee_id FROM follow WHERE follower_id = ?)
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stories)
    }

    // =========================================================================
    // Confessions
    // =========================================================================

    pub async fn insert_confession(&self, text: &str) -> Result<Confession, AppError> {
        let confession = sqlx::query_as::<_, Confession>(
            "INSERT INTO confession (text, timestamp) VALUES (?, ?) RETURNING *",
        )
        .bind(text)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(confession)
    }

    pub async fn get_confessions(&self) -> Result<Vec<Confession>, AppError> {
        let confessions = sqlx::query_as::<_, Confession>(
            "SELECT * FROM confession ORDER BY timestamp DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(confessions)
    }
}
