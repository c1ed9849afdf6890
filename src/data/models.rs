//! Data models
//!
//! Rust structs representing database entities.
//! All ids are SQLite integer keys and all timestamps are
//! milliseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// Account
// =============================================================================

/// A registered account
///
/// The password hash never leaves the server; API responses are
/// built from this row by the converters in `api`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    /// Unique, compared case-sensitively
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
    pub allow_follow_requests: bool,
    pub allow_direct_messages: bool,
    pub show_activity: bool,
    pub show_last_online: bool,
    pub verified_id: bool,
    pub verification_requested: bool,
    /// Badge column value; `None` means no badge
    pub badge: Option<String>,
    pub badge_issued_by: Option<String>,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub last_online: i64,
    pub created_at: i64,
}

/// Fields required to insert an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub avatar: String,
    pub is_admin: bool,
}

/// Profile fields an owner may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.username.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
    }
}

/// Privacy flags an owner may change. `None` leaves the flag untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPatch {
    pub allow_follow_requests: Option<bool>,
    pub allow_direct_messages: Option<bool>,
    pub show_activity: Option<bool>,
    pub show_last_online: Option<bool>,
}

/// Verification badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    None,
    Blue,
    Black,
    Grey,
    Gold,
}

impl Badge {
    /// Column value, `None` for no badge
    pub fn as_column(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Blue => Some("blue"),
            Self::Black => Some("black"),
            Self::Grey => Some("grey"),
            Self::Gold => Some("gold"),
        }
    }

    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some("blue") => Self::Blue,
            Some("black") => Self::Black,
            Some("grey") => Self::Grey,
            Some("gold") => Self::Gold,
            _ => Self::None,
        }
    }
}

// =============================================================================
// Direct messages
// =============================================================================

/// A direct message. Immutable once created apart from the read flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub text: String,
    pub timestamp: i64,
    pub read: bool,
}

impl Message {
    /// The participant that is not `user_id`
    pub fn peer_of(&self, user_id: i64) -> i64 {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn involves(&self, user_id: i64) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// Fields required to append a message
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub text: String,
    pub timestamp: i64,
}

// =============================================================================
// Posts
// =============================================================================

/// A post in the feed
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub image: Option<String>,
    pub mood: Option<String>,
    pub location: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub text: String,
    pub image: Option<String>,
    pub mood: Option<String>,
    pub location: Option<String>,
    pub timestamp: i64,
}

/// Reaction kinds on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Retweet,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Retweet => "retweet",
        }
    }
}

/// A single reaction row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reaction {
    pub post_id: i64,
    pub account_id: i64,
    pub kind: String,
}

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub text: String,
    pub timestamp: i64,
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification for user interactions
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    /// Recipient
    pub user_id: i64,
    pub from_user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub post_id: Option<i64>,
    pub read: bool,
    pub timestamp: i64,
}

/// Notification types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Like,
    Retweet,
    Comment,
    Follow,
    VerificationApproved,
    VerificationDenied,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Retweet => "retweet",
            Self::Comment => "comment",
            Self::Follow => "follow",
            Self::VerificationApproved => "verification_approved",
            Self::VerificationDenied => "verification_denied",
        }
    }
}

impl From<ReactionKind> for NotificationKind {
    fn from(kind: ReactionKind) -> Self {
        match kind {
            ReactionKind::Like => Self::Like,
            ReactionKind::Retweet => Self::Retweet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub from_user_id: i64,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
}

// =============================================================================
// Stories & confessions
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub timestamp: i64,
}

/// Anonymous confession; no author is recorded
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Confession {
    pub id: i64,
    pub text: String,
    pub timestamp: i64,
}
