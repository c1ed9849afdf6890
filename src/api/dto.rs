//! API response DTOs
//!
//! Wire shapes of the JSON API. Field names are camelCase.

use serde::{Deserialize, Serialize};

use crate::data::Badge;

/// Account as returned by every account endpoint
///
/// `password` always carries the `"hashed"` placeholder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
    /// Follower ids, duplicates and synthetic ids included
    pub followers: Vec<i64>,
    pub following: Vec<i64>,
    pub privacy_settings: PrivacySettingsResponse,
    #[serde(rename = "verifiedID")]
    pub verified_id: bool,
    pub verification_requested: bool,
    pub badge: Option<Badge>,
    pub badge_issued_by: Option<String>,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub last_online: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettingsResponse {
    pub allow_follow_requests: bool,
    pub allow_direct_messages: bool,
    pub show_activity: bool,
    pub show_last_online: bool,
}

/// Response of `PUT /api/accounts/:id`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_pending: bool,
}

/// Response of `POST /api/accounts/:id/follow`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub following: bool,
    pub account: AccountResponse,
}

/// Signup request
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfessionRequest {
    pub text: String,
}

/// `{"success": true}`
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Result of a bulk read-marking call
#[derive(Debug, Clone, Serialize)]
pub struct MarkedReadResponse {
    pub updated: u64,
}
