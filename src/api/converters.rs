//! Conversion functions from database models to API DTOs

use crate::api::dto::*;
use crate::auth::password::PASSWORD_UNCHANGED;
use crate::data::{Account, Badge};

/// Convert Account to AccountResponse
///
/// The follow lists are not part of the account row and are passed in.
pub fn account_to_response(
    account: &Account,
    followers: Vec<i64>,
    following: Vec<i64>,
) -> AccountResponse {
    let badge = match Badge::from_column(account.badge.as_deref()) {
        Badge::None => None,
        badge => Some(badge),
    };

    AccountResponse {
        id: account.id,
        name: account.name.clone(),
        username: account.username.clone(),
        password: PASSWORD_UNCHANGED.to_string(),
        display_name: account.display_name.clone(),
        bio: account.bio.clone(),
        avatar: account.avatar.clone(),
        followers,
        following,
        privacy_settings: PrivacySettingsResponse {
            allow_follow_requests: account.allow_follow_requests,
            allow_direct_messages: account.allow_direct_messages,
            show_activity: account.show_activity,
            show_last_online: account.show_last_online,
        },
        verified_id: account.verified_id,
        verification_requested: account.verification_requested,
        badge,
        badge_issued_by: account.badge_issued_by.clone(),
        is_admin: account.is_admin,
        is_suspended: account.is_suspended,
        last_online: account.last_online,
        created_at: account.created_at,
    }
}
