//! API layer
//!
//! HTTP handlers for:
//! - Accounts, login and moderation commands
//! - Posts, reactions and comments
//! - Direct messages
//! - Notifications, stories and confessions

mod accounts;
mod converters;
mod dto;
mod extract;
mod messages;
mod notifications;
mod posts;
mod stories;

pub use converters::*;
pub use dto::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Create the JSON API router, mounted under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Accounts
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/:id",
            get(accounts::get_account).put(accounts::update_account),
        )
        .route("/accounts/:id/follow", post(accounts::toggle_follow))
        .route("/accounts/:id/story", get(accounts::latest_story))
        .route("/login", post(accounts::login))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/:id", axum::routing::delete(posts::delete_post))
        .route("/posts/:id/like", post(posts::toggle_like))
        .route("/posts/:id/retweet", post(posts::toggle_retweet))
        .route("/posts/:id/comments", post(posts::add_comment))
        .route(
            "/posts/:id/comments/:comment_id",
            axum::routing::delete(posts::delete_comment),
        )
        // Direct messages
        .route("/messages", post(messages::send_message))
        .route(
            "/messages/:id",
            get(messages::get_conversations).delete(messages::delete_message),
        )
        .route("/messages/:id/:other_id", get(messages::get_conversation))
        .route(
            "/messages/:id/:other_id/read",
            post(messages::mark_conversation_read),
        )
        // Notifications
        .route("/notifications/:id", get(notifications::get_notifications))
        .route(
            "/notifications/:id/read",
            post(notifications::mark_notifications_read),
        )
        // Stories & confessions
        .route("/stories", post(stories::create_story))
        .route("/stories/feed/:id", get(stories::story_feed))
        .route(
            "/confessions",
            get(stories::list_confessions).post(stories::create_confession),
        )
}
