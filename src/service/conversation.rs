//! Conversation aggregation
//!
//! Derives a mailbox's conversation list from the flat message log:
//! one entry per peer, holding the latest message exchanged with them.
//! Recomputed on every read.

use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::data::Message;

/// Latest message exchanged with one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub peer_id: i64,
    #[serde(flatten)]
    pub message: Message,
}

/// Later timestamp wins; equal timestamps fall back to the higher id.
fn is_newer(candidate: &Message, current: &Message) -> bool {
    (candidate.timestamp, candidate.id) > (current.timestamp, current.id)
}

/// Build the conversation list of `user_id`
///
/// Messages not involving `user_id` are ignored. The result is sorted
/// newest first by the selected message (ties by id, descending).
pub fn conversation_summaries<I>(user_id: i64, messages: I) -> Vec<ConversationSummary>
where
    I: IntoIterator<Item = Message>,
{
    let mut latest: HashMap<i64, Message> = HashMap::new();

    for message in messages {
        if !message.involves(user_id) {
            continue;
        }

        match latest.entry(message.peer_of(user_id)) {
            Entry::Occupied(mut entry) => {
                if is_newer(&message, entry.get()) {
                    entry.insert(message);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(message);
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = latest
        .into_iter()
        .map(|(peer_id, message)| ConversationSummary { peer_id, message })
        .collect();

    summaries.sort_by(|a, b| {
        b.message
            .timestamp
            .cmp(&a.message.timestamp)
            .then_with(|| b.message.id.cmp(&a.message.id))
    });

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i64, sender_id: i64, receiver_id: i64, timestamp: i64, text: &str) -> Message {
        Message {
            id,
            sender_id,
            receiver_id,
            text: text.to_string(),
            timestamp,
            read: false,
        }
    }

    #[test]
    fn latest_message_per_peer() {
        let messages = vec![
            msg(1, 1, 2, 100, "hi"),
            msg(2, 2, 1, 200, "hello"),
        ];

        let summaries = conversation_summaries(1, messages);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].peer_id, 2);
        assert_eq!(summaries[0].message.text, "hello");
        assert_eq!(summaries[0].message.timestamp, 200);
    }

    #[test]
    fn one_entry_per_distinct_peer_sorted_newest_first() {
        let messages = vec![
            msg(1, 1, 2, 100, "to two"),
            msg(2, 3, 1, 300, "from three"),
            msg(3, 1, 4, 50, "to four"),
            msg(4, 2, 1, 150, "from two"),
            msg(5, 3, 1, 120, "older from three"),
        ];

        let summaries = conversation_summaries(1, messages);
        let peers: Vec<i64> = summaries.iter().map(|s| s.peer_id).collect();

        assert_eq!(peers, vec![3, 2, 4]);
        assert_eq!(summaries[0].message.text, "from three");
        assert_eq!(summaries[1].message.text, "from two");
    }

    #[test]
    fn equal_timestamps_pick_highest_id() {
        let messages = vec![
            msg(9, 1, 2, 100, "later id"),
            msg(3, 2, 1, 100, "earlier id"),
        ];

        let summaries = conversation_summaries(1, messages);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message.id, 9);
    }

    #[test]
    fn selected_message_is_never_older_than_others_with_that_peer() {
        let messages: Vec<Message> = (1..=20)
            .map(|i| {
                let peer = 10 + (i % 4);
                let timestamp = (i * 37) % 11;
                if i % 2 == 0 {
                    msg(i, 1, peer, timestamp, "out")
                } else {
                    msg(i, peer, 1, timestamp, "in")
                }
            })
            .collect();

        let summaries = conversation_summaries(1, messages.clone());

        assert_eq!(summaries.len(), 4);
        for summary in &summaries {
            for message in messages.iter().filter(|m| m.peer_of(1) == summary.peer_id) {
                assert!(summary.message.timestamp >= message.timestamp);
            }
        }
    }

    #[test]
    fn ignores_messages_between_other_users() {
        let messages = vec![msg(1, 5, 6, 100, "not ours"), msg(2, 1, 5, 90, "ours")];

        let summaries = conversation_summaries(1, messages);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].peer_id, 5);
        assert_eq!(summaries[0].message.text, "ours");
    }

    #[test]
    fn serializes_message_fields_with_peer() {
        let summary = ConversationSummary {
            peer_id: 2,
            message: msg(4, 1, 2, 200, "hello"),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["peerId"], 2);
        assert_eq!(json["senderId"], 1);
        assert_eq!(json["text"], "hello");
    }
}
