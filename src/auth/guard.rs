//! Authorization guard
//!
//! Pure checks comparing the caller id against the identity an
//! operation reads or writes for. A failed check returns
//! `AppError::Unauthorized` and has no side effects.

use super::CallerId;
use crate::data::Message;
use crate::error::AppError;

fn ensure_same(caller: CallerId, expected: i64, message: &str) -> Result<i64, AppError> {
    match caller.0 {
        Some(id) if id == expected => Ok(id),
        other => {
            tracing::warn!(caller = ?other, expected, "Caller identity mismatch");
            Err(AppError::unauthorized(message))
        }
    }
}

/// The caller must be present
pub fn require_caller(caller: CallerId) -> Result<i64, AppError> {
    caller.0.ok_or_else(|| {
        tracing::warn!("Request without caller identity");
        AppError::unauthorized("Authentication required")
    })
}

/// Reading the conversation list of `owner_id`
pub fn authorize_mailbox(caller: CallerId, owner_id: i64) -> Result<i64, AppError> {
    ensure_same(caller, owner_id, "You can only view your own messages")
}

/// Reading or acknowledging the conversation between `owner_id` and a peer
pub fn authorize_conversation(caller: CallerId, owner_id: i64) -> Result<i64, AppError> {
    ensure_same(caller, owner_id, "You can only view your own conversations")
}

/// Sending a message that declares `sender_id` as its author.
/// A body without a sender never matches the caller.
pub fn authorize_sender(caller: CallerId, sender_id: Option<i64>) -> Result<i64, AppError> {
    const MESSAGE: &str = "You can only send messages as yourself";
    match sender_id {
        Some(sender_id) => ensure_same(caller, sender_id, MESSAGE),
        None => {
            tracing::warn!(caller = ?caller.0, "Message without sender");
            Err(AppError::unauthorized(MESSAGE))
        }
    }
}

/// Deleting `message`: the caller must be its sender or receiver
pub fn authorize_message_delete(caller_id: i64, message: &Message) -> Result<(), AppError> {
    if message.involves(caller_id) {
        return Ok(());
    }

    tracing::warn!(
        caller = caller_id,
        message_id = message.id,
        "Caller is not a participant of the message"
    );
    Err(AppError::unauthorized(
        "You can only delete your own messages",
    ))
}

/// Acting on an account's own resources (profile, notifications, stories)
pub fn authorize_account_owner(caller: CallerId, account_id: i64) -> Result<i64, AppError> {
    ensure_same(caller, account_id, "You can only act on your own account")
}

/// Creating content that declares `author_id` as its author
pub fn authorize_author(caller: CallerId, author_id: i64) -> Result<i64, AppError> {
    ensure_same(caller, author_id, "You can only post as yourself")
}
