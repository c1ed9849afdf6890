//! Database tests

use super::*;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

async fn insert_account(db: &Database, username: &str) -> Account {
    db.insert_account(&NewAccount {
        name: username.to_string(),
        username: username.to_string(),
        password_hash: "hash".to_string(),
        display_name: username.to_string(),
        avatar: "avatar.png".to_string(),
        is_admin: false,
    })
    .await
    .unwrap()
}

async fn insert_message(db: &Database, sender_id: i64, receiver_id: i64, timestamp: i64) -> Message {
    db.insert_message(&NewMessage {
        sender_id,
        receiver_id,
        text: format!("{} -> {} @ {}", sender_id, receiver_id, timestamp),
        timestamp,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_account_insert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let account = insert_account(&db, "alice").await;
    assert_eq!(account.id, 1);
    assert!(account.allow_direct_messages);
    assert!(!account.is_admin);
    assert!(account.badge.is_none());

    let retrieved = db.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(retrieved.username, "alice");

    let by_username = db.get_account_by_username("alice").await.unwrap();
    assert!(by_username.is_some());
    assert!(db.get_account_by_username("Alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_case_sensitive() {
    let (db, _temp_dir) = create_test_db().await;
    insert_account(&db, "alice").await;

    let duplicate = db
        .insert_account(&NewAccount {
            name: "Alice".to_string(),
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            display_name: "Alice".to_string(),
            avatar: String::new(),
            is_admin: false,
        })
        .await;
    assert!(matches!(
        duplicate,
        Err(crate::error::AppError::PreconditionFailed(_))
    ));

    // Different case is a different username
    insert_account(&db, "Alice").await;
    assert_eq!(db.get_all_accounts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let (db, _temp_dir) = create_test_db().await;
    insert_account(&db, "alice").await;
    insert_account(&db, "bob").await;

    let first = insert_message(&db, 1, 2, 100).await;
    let second = insert_message(&db, 1, 2, 200).await;
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);

    assert!(db.delete_message(second.id).await.unwrap());
    let third = insert_message(&db, 1, 2, 300).await;
    assert_eq!(third.id, 3);
}

#[tokio::test]
async fn test_profile_patch_leaves_other_fields() {
    let (db, _temp_dir) = create_test_db().await;
    let account = insert_account(&db, "alice").await;

    let patched = db
        .patch_account_profile(
            account.id,
            &ProfilePatch {
                bio: Some("hello".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(patched.bio, "hello");
    assert_eq!(patched.display_name, "alice");
    assert_eq!(patched.password_hash, "hash");

    let missing = db
        .patch_account_profile(999, &ProfilePatch::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_privacy_patch_and_moderation_flags() {
    let (db, _temp_dir) = create_test_db().await;
    let account = insert_account(&db, "alice").await;

    let patched = db
        .patch_account_privacy(
            account.id,
            &PrivacyPatch {
                allow_direct_messages: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!patched.allow_direct_messages);
    assert!(patched.allow_follow_requests);

    let suspended = db.toggle_suspension(account.id).await.unwrap().unwrap();
    assert!(suspended.is_suspended);
    let restored = db.toggle_suspension(account.id).await.unwrap().unwrap();
    assert!(!restored.is_suspended);

    let badged = db
        .set_badge(account.id, Badge::Gold, Some("alz"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Badge::from_column(badged.badge.as_deref()), Badge::Gold);
    assert_eq!(badged.badge_issued_by.as_deref(), Some("alz"));

    let cleared = db
        .set_badge(account.id, Badge::None, None)
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.badge.is_none());
    assert!(cleared.badge_issued_by.is_none());
}

#[tokio::test]
async fn test_verification_decision_clears_request() {
    let (db, _temp_dir) = create_test_db().await;
    let account = insert_account(&db, "alice").await;

    let requested = db.set_verification_requested(account.id).await.unwrap().unwrap();
    assert!(requested.verification_requested);

    let denied = db.decide_verification(account.id, false).await.unwrap().unwrap();
    assert!(!denied.verification_requested);
    assert!(!denied.verified_id);

    db.set_verification_requested(account.id).await.unwrap();
    let approved = db.decide_verification(account.id, true).await.unwrap().unwrap();
    assert!(!approved.verification_requested);
    assert!(approved.verified_id);
}

#[tokio::test]
async fn test_follow_toggle() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_account(&db, "alice").await;
    let bob = insert_account(&db, "bob").await;

    assert!(db.toggle_follow(alice.id, bob.id).await.unwrap());
    assert!(db.is_following(alice.id, bob.id).await.unwrap());
    assert_eq!(db.get_follower_ids(bob.id).await.unwrap(), vec![alice.id]);
    assert_eq!(db.get_following_ids(alice.id).await.unwrap(), vec![bob.id]);

    assert!(!db.toggle_follow(alice.id, bob.id).await.unwrap());
    assert!(!db.is_following(alice.id, bob.id).await.unwrap());
    assert_eq!(db.count_followers(bob.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_synthetic_followers_descend_below_existing() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_account(&db, "alice").await;
    let bob = insert_account(&db, "bob").await;
    db.toggle_follow(bob.id, alice.id).await.unwrap();

    let total = db.grant_synthetic_followers(alice.id, 3).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(
        db.get_follower_ids(alice.id).await.unwrap(),
        vec![bob.id, -1, -2, -3]
    );

    let total = db.grant_synthetic_followers(alice.id, 2).await.unwrap();
    assert_eq!(total, 6);
    let followers = db.get_follower_ids(alice.id).await.unwrap();
    assert_eq!(&followers[4..], &[-4, -5]);
}

#[tokio::test]
async fn test_history_is_ordered_and_scoped_to_pair() {
    let (db, _temp_dir) = create_test_db().await;

    insert_message(&db, 1, 2, 300).await;
    insert_message(&db, 2, 1, 100).await;
    insert_message(&db, 1, 3, 150).await;
    insert_message(&db, 2, 1, 300).await;
    insert_message(&db, 3, 2, 50).await;

    let history = db.get_messages_between(1, 2).await.unwrap();
    let timestamps: Vec<i64> = history.iter().map(|m| m.timestamp).collect();
    let ids: Vec<i64> = history.iter().map(|m| m.id).collect();

    assert_eq!(timestamps, vec![100, 300, 300]);
    assert_eq!(ids, vec![2, 1, 4]);
    assert!(history.iter().all(|m| m.involves(1) && m.involves(2)));

    let involving = db.get_messages_involving(1).await.unwrap();
    assert_eq!(involving.len(), 4);
}

#[tokio::test]
async fn test_mark_messages_read_only_touches_incoming() {
    let (db, _temp_dir) = create_test_db().await;

    insert_message(&db, 2, 1, 100).await;
    insert_message(&db, 2, 1, 200).await;
    insert_message(&db, 1, 2, 300).await;

    assert_eq!(db.mark_messages_read(1, 2).await.unwrap(), 2);
    assert_eq!(db.mark_messages_read(1, 2).await.unwrap(), 0);

    let history = db.get_messages_between(1, 2).await.unwrap();
    assert!(history.iter().filter(|m| m.receiver_id == 1).all(|m| m.read));
    assert!(history.iter().filter(|m| m.receiver_id == 2).all(|m| !m.read));
}

#[tokio::test]
async fn test_delete_message() {
    let (db, _temp_dir) = create_test_db().await;

    let message = insert_message(&db, 1, 2, 100).await;
    assert_eq!(db.count_messages().await.unwrap(), 1);

    assert!(db.delete_message(message.id).await.unwrap());
    assert!(!db.delete_message(message.id).await.unwrap());
    assert!(db.get_message(message.id).await.unwrap().is_none());
    assert_eq!(db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_post_reactions_and_cascade() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_account(&db, "alice").await;
    let bob = insert_account(&db, "bob").await;

    let post = db
        .insert_post(&NewPost {
            user_id: alice.id,
            text: "hello".to_string(),
            image: None,
            mood: Some("happy".to_string()),
            location: None,
            timestamp: now_millis(),
        })
        .await
        .unwrap();

    assert!(db.toggle_reaction(post.id, bob.id, ReactionKind::Like).await.unwrap());
    assert!(db.toggle_reaction(post.id, bob.id, ReactionKind::Retweet).await.unwrap());
    assert_eq!(db.get_reactions(post.id).await.unwrap().len(), 2);

    assert!(!db.toggle_reaction(post.id, bob.id, ReactionKind::Like).await.unwrap());
    let reactions = db.get_reactions(post.id).await.unwrap();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].kind, "retweet");

    let comment = db.insert_comment(post.id, bob.id, "nice").await.unwrap();
    assert!(db.get_comment(post.id, comment.id).await.unwrap().is_some());
    assert!(db.get_comment(post.id + 1, comment.id).await.unwrap().is_none());

    assert!(db.delete_post(post.id).await.unwrap());
    assert!(db.get_post(post.id).await.unwrap().is_none());
    assert!(db.get_all_reactions().await.unwrap().is_empty());
    assert!(db.get_all_comments().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_notifications_newest_first() {
    let (db, _temp_dir) = create_test_db().await;

    for kind in [NotificationKind::Like, NotificationKind::Follow] {
        db.insert_notification(&NewNotification {
            user_id: 1,
            from_user_id: 2,
            kind,
            post_id: None,
        })
        .await
        .unwrap();
    }

    let notifications = db.get_notifications(1).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].kind, "follow");
    assert!(notifications.iter().all(|n| !n.read));

    assert_eq!(db.mark_all_notifications_read(1).await.unwrap(), 2);
    assert!(db.get_notifications(1).await.unwrap().iter().all(|n| n.read));
    assert!(db.get_notifications(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stories_and_confessions() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_account(&db, "alice").await;
    let bob = insert_account(&db, "bob").await;
    db.toggle_follow(alice.id, bob.id).await.unwrap();

    db.insert_story(bob.id, "first").await.unwrap();
    db.insert_story(bob.id, "second").await.unwrap();
    db.insert_story(alice.id, "mine").await.unwrap();

    let latest = db.get_latest_story(bob.id).await.unwrap().unwrap();
    assert_eq!(latest.text, "second");

    let feed = db.get_followee_stories(alice.id).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert!(feed.iter().all(|s| s.user_id == bob.id));

    db.insert_confession("secret").await.unwrap();
    let confessions = db.get_confessions().await.unwrap();
    assert_eq!(confessions.len(), 1);
    assert_eq!(confessions[0].text, "secret");
}
