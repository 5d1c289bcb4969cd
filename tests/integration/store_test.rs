//! SQLite store integration tests

use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use dmrelay::backend::auth::identity::{IdentityProvider, SqlDirectory, UserProfile};
use dmrelay::backend::messaging::{MessageStore, MessagingService, SqlStore, StoreError};
use dmrelay::shared::messaging::ParticipantPair;

use crate::common::{FileDatabase, TestDatabase};

fn pair() -> (Uuid, Uuid, ParticipantPair) {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    (a, b, ParticipantPair::new(a, b).unwrap())
}

#[tokio::test]
async fn test_unique_pair_constraint_reports_conflict() {
    let db = TestDatabase::new().await;
    let store = SqlStore::new(db.pool().clone());
    let (a, b, p) = pair();

    let created = store.create_conversation(p).await.unwrap();
    assert_matches!(
        store.create_conversation(ParticipantPair::new(b, a).unwrap()).await,
        Err(StoreError::Conflict)
    );

    let found = store.find_or_create_conversation(p).await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(store.find_conversation_between(p).await.unwrap(), Some(created));
}

#[tokio::test]
async fn test_identical_sent_at_orders_by_id() {
    let db = TestDatabase::new().await;
    let store = SqlStore::new(db.pool().clone());
    let (a, b, p) = pair();
    let conversation = store.create_conversation(p).await.unwrap();

    for content in ["first", "second", "third"] {
        store.append_message(conversation.id, a, b, content).await.unwrap();
    }
    sqlx::query("UPDATE messages SET sent_at = '2025-01-01T00:00:00.000000Z'")
        .execute(db.pool())
        .await
        .unwrap();

    let page = store.list_messages_page(conversation.id, 1, 10).await.unwrap();
    let contents: Vec<_> = page.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    let newest = store.list_messages_page(conversation.id, 1, 2).await.unwrap();
    let contents: Vec<_> = newest.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "third"]);
    assert_eq!(newest.total, 3);
}

#[tokio::test]
async fn test_append_bumps_last_message_at_and_checks_participants() {
    let db = TestDatabase::new().await;
    let store = SqlStore::new(db.pool().clone());
    let (a, b, p) = pair();
    let conversation = store.create_conversation(p).await.unwrap();

    let message = store.append_message(conversation.id, b, a, "hello").await.unwrap();
    let reloaded = store.get_conversation(conversation.id).await.unwrap().unwrap();
    assert_eq!(reloaded.last_message_at, Some(message.sent_at));

    assert_matches!(
        store.append_message(conversation.id, a, Uuid::new_v4(), "x").await,
        Err(StoreError::Invalid { .. })
    );
    assert_matches!(
        store.append_message(conversation.id + 100, a, b, "x").await,
        Err(StoreError::NotFound { .. })
    );
}

#[tokio::test]
async fn test_listing_counts_unread_for_listing_user() {
    let db = TestDatabase::new().await;
    let store = SqlStore::new(db.pool().clone());
    let (a, b, p) = pair();
    let conversation = store.create_conversation(p).await.unwrap();

    store.append_message(conversation.id, a, b, "one").await.unwrap();
    store.append_message(conversation.id, a, b, "two").await.unwrap();
    store.append_message(conversation.id, b, a, "three").await.unwrap();

    let for_b = store.list_conversations_for_user(b).await.unwrap();
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_b[0].unread_count, 2);
    assert_eq!(for_b[0].last_message.as_ref().unwrap().content, "three");

    assert_eq!(store.mark_read_for_user(conversation.id, b).await.unwrap(), 2);
    assert_eq!(store.mark_read_for_user(conversation.id, b).await.unwrap(), 0);
    assert_eq!(store.count_unread_for_user(b).await.unwrap(), 0);
    assert_eq!(store.count_unread_for_user(a).await.unwrap(), 1);

    assert!(store
        .list_conversations_for_user(Uuid::new_v4())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_service_over_sqlite() {
    let db = TestDatabase::new().await;
    let directory = SqlDirectory::new(db.pool().clone());
    let alice = UserProfile::new(Uuid::new_v4(), "Alice", "Archer");
    let bob = UserProfile::new(Uuid::new_v4(), "", "");
    directory.upsert(&alice).await.unwrap();
    directory.upsert(&bob).await.unwrap();
    assert!(directory.user_exists(bob.id).await.unwrap());

    let service = MessagingService::new(
        Arc::new(SqlStore::new(db.pool().clone())),
        Arc::new(directory),
    );

    let view = service.send_message(alice.id, bob.id, "hi").await.unwrap();
    assert_eq!(view.receiver_name, "Unknown User");

    let list = service.list_conversations(alice.id).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].other_participant_name, "Unknown User");
    assert_eq!(service.unread_count(bob.id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_sends_on_file_database() {
    let db = FileDatabase::new(8).await;
    let directory = SqlDirectory::new(db.pool().clone());
    let alice = UserProfile::new(Uuid::new_v4(), "Alice", "Archer");
    let bob = UserProfile::new(Uuid::new_v4(), "Bob", "Baker");
    directory.upsert(&alice).await.unwrap();
    directory.upsert(&bob).await.unwrap();

    let service = MessagingService::new(
        Arc::new(SqlStore::new(db.pool().clone())),
        Arc::new(directory),
    );

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = service.clone();
        let (from, to) = if i % 2 == 0 {
            (alice.id, bob.id)
        } else {
            (bob.id, alice.id)
        };
        handles.push(tokio::spawn(async move {
            service.send_message(from, to, &format!("m{}", i)).await
        }));
    }

    let mut conversation_ids = Vec::new();
    for handle in handles {
        let sent = handle.await.unwrap();
        assert!(sent.is_ok(), "send failed: {:?}", sent.err());
        conversation_ids.extend(sent.ok().map(|m| m.conversation_id));
    }
    conversation_ids.dedup();
    assert_eq!(conversation_ids.len(), 1);

    let conversations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(conversations, 1);
    assert_eq!(messages, 32);

    assert_eq!(service.unread_count(alice.id).await.unwrap(), 16);
    assert_eq!(service.unread_count(bob.id).await.unwrap(), 16);
    let conversation = service
        .get_conversation(conversation_ids[0], alice.id, 1, 50)
        .await
        .unwrap();
    assert_eq!(conversation.total_messages, 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_and_mark_reads_on_file_database() {
    let db = FileDatabase::new(8).await;
    let store = Arc::new(SqlStore::new(db.pool().clone()));
    let (a, b, p) = pair();
    let conversation_id = store.create_conversation(p).await.unwrap().id;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store.append_message(conversation_id, a, b, "ping").await.map(|_| ())
            } else {
                store.mark_read_for_user(conversation_id, b).await.map(|_| ())
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let page = store.list_messages_page(conversation_id, 1, 20).await.unwrap();
    assert_eq!(page.total, 8);
    let reloaded = store.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(
        reloaded.last_message_at,
        page.messages.last().map(|m| m.sent_at)
    );
}
