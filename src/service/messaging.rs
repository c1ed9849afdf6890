//! Direct messaging
//!
//! `MessageLog` is the storage-facing log. `MessagingService` runs the
//! authorization guard and the moderation gate before touching it.

use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{CallerId, guard};
use crate::data::{Database, Message, NewMessage, now_millis};
use crate::error::AppError;
use crate::metrics::MESSAGES_SENT_TOTAL;
use crate::service::conversation::{ConversationSummary, conversation_summaries};
use crate::service::{IdentityStore, ModerationGate};

/// Append-only message log
pub struct MessageLog {
    db: Arc<Database>,
}

impl MessageLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a message stamped with the current time, unread.
    ///
    /// Peer existence and privacy are the caller's concern.
    pub async fn append(
        &self,
        sender_id: i64,
        receiver_id: i64,
        text: String,
    ) -> Result<Message, AppError> {
        self.db
            .insert_message(&NewMessage {
                sender_id,
                receiver_id,
                text,
                timestamp: now_millis(),
            })
            .await
    }

    /// Messages between `a` and `b`, oldest first (ties by id)
    pub async fn history(&self, a: i64, b: i64) -> Result<Vec<Message>, AppError> {
        self.db.get_messages_between(a, b).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Message>, AppError> {
        self.db.get_message(id).await
    }

    /// # Errors
    /// `NotFound` if no message has this id
    pub async fn remove(&self, id: i64) -> Result<(), AppError> {
        if self.db.delete_message(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Message"))
        }
    }

    pub async fn involving(&self, user_id: i64) -> Result<Vec<Message>, AppError> {
        self.db.get_messages_involving(user_id).await
    }

    /// # Returns
    /// Number of messages that changed state
    pub async fn mark_read(&self, receiver_id: i64, sender_id: i64) -> Result<u64, AppError> {
        self.db.mark_messages_read(receiver_id, sender_id).await
    }
}

/// `POST /api/messages` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub sender_id: Option<i64>,
    pub receiver_id: i64,
    #[serde(default)]
    pub text: String,
}

pub struct MessagingService {
    log: MessageLog,
    identity: IdentityStore,
    gate: Arc<ModerationGate>,
}

impl MessagingService {
    pub fn new(db: Arc<Database>, identity: IdentityStore, gate: Arc<ModerationGate>) -> Self {
        Self {
            log: MessageLog::new(db),
            identity,
            gate,
        }
    }

    /// Conversation list of `user_id`, newest first
    pub async fn conversations(
        &self,
        caller: CallerId,
        user_id: i64,
    ) -> Result<Vec<ConversationSummary>, AppError> {
        guard::authorize_mailbox(caller, user_id)?;
        let messages = self.log.involving(user_id).await?;
        Ok(conversation_summaries(user_id, messages))
    }

    pub async fn history(
        &self,
        caller: CallerId,
        user_id: i64,
        other_user_id: i64,
    ) -> Result<Vec<Message>, AppError> {
        guard::authorize_conversation(caller, user_id)?;
        self.log.history(user_id, other_user_id).await
    }

    pub async fn send(&self, caller: CallerId, request: SendMessage) -> Result<Message, AppError> {
        let sender_id = guard::authorize_sender(caller, request.sender_id)?;

        if request.text.trim().is_empty() {
            return Err(AppError::Validation(
                "Message text cannot be empty".to_string(),
            ));
        }

        let sender = self
            .identity
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown caller"))?;
        self.gate.ensure_active(&sender)?;

        let receiver = self.identity.get(request.receiver_id).await?;
        self.gate.ensure_accepts_messages(&receiver)?;

        let message = self
            .log
            .append(sender_id, request.receiver_id, request.text)
            .await?;

        MESSAGES_SENT_TOTAL.inc();
        tracing::debug!(
            message_id = message.id,
            sender_id = message.sender_id,
            receiver_id = message.receiver_id,
            "Message sent"
        );
        Ok(message)
    }

    /// Delete a message as one of its participants
    pub async fn delete(&self, caller: CallerId, message_id: i64) -> Result<(), AppError> {
        let caller_id = guard::require_caller(caller)?;
        let message = self
            .log
            .get(message_id)
            .await?
            .ok_or(AppError::NotFound("Message"))?;

        guard::authorize_message_delete(caller_id, &message)?;
        self.log.remove(message_id).await?;

        tracing::debug!(message_id, caller_id, "Message deleted");
        Ok(())
    }

    /// Mark messages from `other_user_id` to `user_id` as read
    pub async fn mark_read(
        &self,
        caller: CallerId,
        user_id: i64,
        other_user_id: i64,
    ) -> Result<u64, AppError> {
        guard::authorize_conversation(caller, user_id)?;
        self.log.mark_read(user_id, other_user_id).await
    }
}
