//! Posts, reactions and comments

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{CallerId, guard};
use crate::data::{
    Account, Comment, Database, NewPost, NotificationKind, Post, Reaction, ReactionKind,
    now_millis,
};
use crate::error::{AppError, ForbiddenReason};
use crate::service::{IdentityStore, ModerationGate, NotificationService};

/// A post together with its reactions and comments
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    /// Account ids that liked the post
    pub likes: Vec<i64>,
    /// Account ids that retweeted the post
    pub retweets: Vec<i64>,
    pub comments: Vec<Comment>,
}

impl PostView {
    fn assemble(post: Post, reactions: &[Reaction], comments: Vec<Comment>) -> Self {
        let post_id = post.id;
        let ids = |kind: ReactionKind| -> Vec<i64> {
            reactions
                .iter()
                .filter(|r| r.post_id == post_id && r.kind == kind.as_str())
                .map(|r| r.account_id)
                .collect()
        };

        Self {
            likes: ids(ReactionKind::Like),
            retweets: ids(ReactionKind::Retweet),
            comments,
            post,
        }
    }
}

/// `POST /api/posts` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub user_id: i64,
    #[serde(default)]
    pub text: String,
    pub image: Option<String>,
    pub mood: Option<String>,
    pub location: Option<String>,
}

/// `POST /api/posts/{id}/comments` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub user_id: i64,
    pub text: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct PostService {
    db: Arc<Database>,
    identity: IdentityStore,
    gate: Arc<ModerationGate>,
    notifications: NotificationService,
}

impl PostService {
    pub fn new(
        db: Arc<Database>,
        identity: IdentityStore,
        gate: Arc<ModerationGate>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db,
            identity,
            gate,
            notifications,
        }
    }

    /// All posts, newest first
    pub async fn list(&self) -> Result<Vec<PostView>, AppError> {
        let posts = self.db.get_posts().await?;
        let reactions = self.db.get_all_reactions().await?;

        let mut comments_by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for comment in self.db.get_all_comments().await? {
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(comment);
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let comments = comments_by_post.remove(&post.id).unwrap_or_default();
                PostView::assemble(post, &reactions, comments)
            })
            .collect())
    }

    pub async fn get(&self, post_id: i64) -> Result<PostView, AppError> {
        let post = self.find_post(post_id).await?;
        let reactions = self.db.get_reactions(post_id).await?;
        let comments = self.db.get_comments(post_id).await?;
        Ok(PostView::assemble(post, &reactions, comments))
    }

    pub async fn create(&self, caller: CallerId, request: CreatePost) -> Result<PostView, AppError> {
        guard::authorize_author(caller, request.user_id)?;
        let author = self.acting_account(request.user_id).await?;
        self.gate.ensure_active(&author)?;

        let text = request.text.trim().to_string();
        let image = non_blank(request.image);
        if text.is_empty() && image.is_none() {
            return Err(AppError::Validation(
                "A post needs text or an image".to_string(),
            ));
        }

        let post = self
            .db
            .insert_post(&NewPost {
                user_id: author.id,
                text,
                image,
                mood: non_blank(request.mood),
                location: non_blank(request.location),
                timestamp: now_millis(),
            })
            .await?;

        tracing::debug!(post_id = post.id, user_id = post.user_id, "Post created");
        Ok(PostView::assemble(post, &[], Vec::new()))
    }

    /// Author or any admin
    pub async fn delete(&self, caller: CallerId, post_id: i64) -> Result<(), AppError> {
        let caller_id = guard::require_caller(caller)?;
        let post = self.find_post(post_id).await?;
        let actor = self.acting_account(caller_id).await?;

        if post.user_id != actor.id && !self.gate.is_admin(&actor) {
            return Err(AppError::Forbidden(ForbiddenReason::InsufficientPrivilege));
        }

        self.db.delete_post(post_id).await?;
        tracing::info!(post_id, caller_id, "Post deleted");
        Ok(())
    }

    /// Toggle a like or retweet by the caller
    pub async fn toggle_reaction(
        &self,
        caller: CallerId,
        post_id: i64,
        kind: ReactionKind,
    ) -> Result<PostView, AppError> {
        let caller_id = guard::require_caller(caller)?;
        let actor = self.acting_account(caller_id).await?;
        self.gate.ensure_active(&actor)?;

        let post = self.find_post(post_id).await?;
        let added = self.db.toggle_reaction(post_id, caller_id, kind).await?;
        if added {
            self.notifications
                .notify(post.user_id, caller_id, kind.into(), Some(post_id))
                .await;
        }

        tracing::debug!(post_id, caller_id, kind = kind.as_str(), added, "Reaction toggled");
        self.get(post_id).await
    }

    pub async fn add_comment(
        &self,
        caller: CallerId,
        post_id: i64,
        request: CreateComment,
    ) -> Result<Comment, AppError> {
        guard::authorize_author(caller, request.user_id)?;
        let author = self.acting_account(request.user_id).await?;
        self.gate.ensure_active(&author)?;

        let text = request.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Comment text cannot be empty".to_string(),
            ));
        }

        let post = self.find_post(post_id).await?;
        let comment = self.db.insert_comment(post_id, author.id, text).await?;
        self.notifications
            .notify(post.user_id, author.id, NotificationKind::Comment, Some(post_id))
            .await;

        Ok(comment)
    }

    /// Comment author, post author or any admin
    pub async fn delete_comment(
        &self,
        caller: CallerId,
        post_id: i64,
        comment_id: i64,
    ) -> Result<(), AppError> {
        let caller_id = guard::require_caller(caller)?;
        let post = self.find_post(post_id).await?;
        let comment = self
            .db
            .get_comment(post_id, comment_id)
            .await?
            .ok_or(AppError::NotFound("Comment"))?;
        let actor = self.acting_account(caller_id).await?;

        let allowed = comment.user_id == actor.id
            || post.user_id == actor.id
            || self.gate.is_admin(&actor);
        if !allowed {
            return Err(AppError::Forbidden(ForbiddenReason::InsufficientPrivilege));
        }

        self.db.delete_comment(comment_id).await?;
        Ok(())
    }

    async fn find_post(&self, post_id: i64) -> Result<Post, AppError> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound("Post"))
    }

    async fn acting_account(&self, id: i64) -> Result<Arc<Account>, AppError> {
        self.identity
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown caller"))
    }
}
