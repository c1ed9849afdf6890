//! E2E tests for direct messaging authorization and aggregation

mod common;

use common::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn test_send_and_read_conversation() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    let message = server.send_message(alice.id, bob.id, "hi").await;
    assert_eq!(message["senderId"], alice.id);
    assert_eq!(message["receiverId"], bob.id);
    assert_eq!(message["read"], false);
    server.send_message(bob.id, alice.id, "hello").await;

    let response = server
        .get_as(&format!("/api/messages/{}/{}", alice.id, bob.id), alice.id)
        .await;
    assert_eq!(response.status(), 200);

    let history: Vec<Value> = response.json().await.unwrap();
    let texts: Vec<&str> = history.iter().map(|m| m["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["hi", "hello"]);

    let timestamps: Vec<i64> = history.iter().map(|m| m["timestamp"].as_i64().unwrap()).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_conversation_summaries_pick_latest_per_peer() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;
    let carol = server.create_test_account("carol").await;

    server.send_message(alice.id, bob.id, "hi").await;
    server.send_message(carol.id, alice.id, "hey alice").await;
    server.send_message(bob.id, alice.id, "hello").await;

    let response = server
        .get_as(&format!("/api/messages/{}", alice.id), alice.id)
        .await;
    assert_eq!(response.status(), 200);

    let summaries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["peerId"], bob.id);
    assert_eq!(summaries[0]["text"], "hello");
    assert_eq!(summaries[1]["peerId"], carol.id);
    assert_eq!(summaries[1]["text"], "hey alice");
}

#[tokio::test]
async fn test_reading_another_mailbox_is_forbidden() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    let response = server
        .get_as(&format!("/api/messages/{}", alice.id), bob.id)
        .await;
    assert_eq!(response.status(), 403);

    let response = server
        .get_as(&format!("/api/messages/{}/{}", alice.id, bob.id), bob.id)
        .await;
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .get(&server.url(&format!("/api/messages/{}", alice.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_send_as_someone_else_is_rejected_without_append() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;
    server.send_message(alice.id, bob.id, "hi").await;

    let before = server.state.db.count_messages().await.unwrap();

    let response = server
        .post_as(
            "/api/messages",
            bob.id,
            json!({ "senderId": alice.id, "receiverId": bob.id, "text": "forged" }),
        )
        .await;
    assert_eq!(response.status(), 403);
    let json: Value = response.json().await.unwrap();
    assert_eq!(
        json["error"],
        "Unauthorized: You can only send messages as yourself"
    );

    assert_eq!(server.state.db.count_messages().await.unwrap(), before);
}

#[tokio::test]
async fn test_third_party_cannot_delete() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;
    let mallory = server.create_test_account("mallory").await;

    let message = server.send_message(alice.id, bob.id, "private").await;
    let id = message["id"].as_i64().unwrap();

    let response = server
        .delete_as(&format!("/api/messages/{}", id), mallory.id)
        .await;
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(&server.url(&format!("/api/messages/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    assert!(server.state.db.get_message(id).await.unwrap().is_some());

    let response = server
        .delete_as(&format!("/api/messages/{}", id), bob.id)
        .await;
    assert_eq!(response.status(), 200);
    assert!(server.state.db.get_message(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_message_is_404() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;

    let response = server.delete_as("/api/messages/4242", alice.id).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_send_to_missing_receiver_is_404() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "senderId": alice.id, "receiverId": 999, "text": "anyone?" }),
        )
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_receiver_privacy_blocks_messages() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    let response = server
        .command(
            bob.id,
            bob.id,
            json!({ "action": "updatePrivacy", "allowDirectMessages": false }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "senderId": alice.id, "receiverId": bob.id, "text": "hi" }),
        )
        .await;
    assert_eq!(response.status(), 403);
    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_suspended_sender_cannot_message() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;
    server.suspend(alice.id).await;

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "senderId": alice.id, "receiverId": bob.id, "text": "hi" }),
        )
        .await;
    assert_eq!(response.status(), 403);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Forbidden: suspended");

    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "senderId": alice.id, "receiverId": bob.id, "text": "   " }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_send_without_sender_is_rejected() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "receiverId": bob.id, "text": "who am i" }),
        )
        .await;
    assert_eq!(response.status(), 403);
    let json: Value = response.json().await.unwrap();
    assert_eq!(
        json["error"],
        "Unauthorized: You can only send messages as yourself"
    );

    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_send_without_text_is_a_json_error() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "senderId": alice.id, "receiverId": bob.id }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Message text cannot be empty");
}

#[tokio::test]
async fn test_malformed_bodies_and_paths_return_json_errors() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;

    let response = server
        .post_as(
            "/api/messages",
            alice.id,
            json!({ "senderId": alice.id, "receiverId": "bob", "text": "hi" }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].is_string());

    let response = server.delete_as("/api/messages/abc", alice.id).await;
    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_mark_conversation_read() {
    let server = TestServer::new().await;
    let alice = server.create_test_account("alice").await;
    let bob = server.create_test_account("bob").await;

    server.send_message(bob.id, alice.id, "one").await;
    server.send_message(bob.id, alice.id, "two").await;

    let path = format!("/api/messages/{}/{}/read", alice.id, bob.id);
    let response = server.post_as(&path, bob.id, json!({})).await;
    assert_eq!(response.status(), 403);

    let response = server.post_as(&path, alice.id, json!({})).await;
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["updated"], 2);
}
