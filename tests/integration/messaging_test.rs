//! Messaging service integration tests

use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use dmrelay::backend::error::BackendError;
use dmrelay::backend::messaging::MessagingService;

use crate::common::{add_user, memory_service, seeded_users};

#[tokio::test]
async fn test_first_message_creates_one_conversation() {
    let users = seeded_users();
    let (service, store) = memory_service(&users);

    let echo = service.send_message(users.alice, users.bob, "hi").await.unwrap();
    assert!(!echo.is_read);
    assert_eq!(echo.sender_name, "Alice Archer");
    assert_eq!(echo.receiver_name, "Bob Baker");

    assert_eq!(store.conversation_count().await, 1);
    assert_eq!(service.unread_count(users.bob).await.unwrap(), 1);
    assert_eq!(service.unread_count(users.alice).await.unwrap(), 0);

    let detail = service
        .get_conversation(echo.conversation_id, users.bob, 1, 10)
        .await
        .unwrap();
    assert_eq!(detail.total_messages, 1);
    assert_eq!(detail.messages[0].content, "hi");
}

#[tokio::test]
async fn test_both_directions_share_one_conversation() {
    let users = seeded_users();
    let (service, store) = memory_service(&users);

    let first = service.send_message(users.alice, users.bob, "ping").await.unwrap();
    let reply = service.send_message(users.bob, users.alice, "pong").await.unwrap();
    let opened = service
        .get_or_create_conversation(users.alice, users.bob)
        .await
        .unwrap();

    assert_eq!(first.conversation_id, reply.conversation_id);
    assert_eq!(opened.id, first.conversation_id);
    assert_eq!(store.conversation_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_sends_yield_one_conversation() {
    let users = seeded_users();
    let (service, store) = memory_service(&users);

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        let (from, to) = if i % 2 == 0 {
            (users.alice, users.bob)
        } else {
            (users.bob, users.alice)
        };
        handles.push(tokio::spawn(async move {
            service.send_message(from, to, &format!("m{}", i)).await
        }));
    }

    let mut conversation_ids = Vec::new();
    for handle in handles {
        conversation_ids.push(handle.await.unwrap().unwrap().conversation_id);
    }
    conversation_ids.dedup();

    assert_eq!(conversation_ids.len(), 1);
    assert_eq!(store.conversation_count().await, 1);
}

#[tokio::test]
async fn test_list_is_scoped_and_ordered_by_activity() {
    let users = seeded_users();
    let carol = add_user(&users, "Carol", "Cooper");
    let dave = add_user(&users, "Dave", "");
    let (service, _) = memory_service(&users);

    service.send_message(users.alice, users.bob, "to bob").await.unwrap();
    service.send_message(carol, users.alice, "to alice").await.unwrap();
    // Not involving alice
    service.send_message(users.bob, dave, "unrelated").await.unwrap();
    // Opened but empty: sorts by created_at, which is the newest
    let empty = service.get_or_create_conversation(users.alice, dave).await.unwrap();

    let list = service.list_conversations(users.alice).await.unwrap();
    let names: Vec<_> = list.iter().map(|c| c.other_participant_name.as_str()).collect();
    assert_eq!(names, vec!["Dave", "Carol Cooper", "Bob Baker"]);

    assert_eq!(list[0].id, empty.id);
    assert!(list[0].last_message.is_none());
    assert_eq!(list[1].unread_count, 1);
    assert_eq!(list[2].unread_count, 0);
    assert_eq!(list[1].last_message.as_ref().unwrap().content, "to alice");
}

#[tokio::test]
async fn test_non_participant_is_forbidden() {
    let users = seeded_users();
    let mallory = add_user(&users, "Mallory", "Mole");
    let (service, _) = memory_service(&users);

    let message = service.send_message(users.alice, users.bob, "secret").await.unwrap();

    let err = service
        .get_conversation(message.conversation_id, mallory, 1, 10)
        .await
        .unwrap_err();
    assert_matches!(err, BackendError::Forbidden { .. });
    assert_eq!(err.message(), "You are not part of this conversation");

    assert_matches!(
        service.mark_read(message.conversation_id, mallory).await,
        Err(BackendError::Forbidden { .. })
    );
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let users = seeded_users();
    let (service, _) = memory_service(&users);

    let message = service.send_message(users.alice, users.bob, "read me").await.unwrap();
    assert!(service.mark_read(message.conversation_id, users.bob).await.unwrap());

    let first = service
        .get_conversation(message.conversation_id, users.bob, 1, 10)
        .await
        .unwrap();
    let read_at = first.messages[0].read_at;
    assert!(read_at.is_some());
    assert!(first.messages[0].is_read);

    assert!(service.mark_read(message.conversation_id, users.bob).await.unwrap());
    let second = service
        .get_conversation(message.conversation_id, users.bob, 1, 10)
        .await
        .unwrap();
    assert_eq!(second.messages[0].read_at, read_at);
    assert_eq!(service.unread_count(users.bob).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sender_marking_read_changes_nothing() {
    let users = seeded_users();
    let (service, _) = memory_service(&users);

    let message = service.send_message(users.alice, users.bob, "hi").await.unwrap();
    service.mark_read(message.conversation_id, users.alice).await.unwrap();
    assert_eq!(service.unread_count(users.bob).await.unwrap(), 1);
}

#[tokio::test]
async fn test_pages_walk_backwards_through_history() {
    let users = seeded_users();
    let (service, _) = memory_service(&users);

    let mut conversation_id = 0;
    for i in 1..=25 {
        conversation_id = service
            .send_message(users.alice, users.bob, &format!("m{:02}", i))
            .await
            .unwrap()
            .conversation_id;
    }

    let page1 = service.get_conversation(conversation_id, users.alice, 1, 10).await.unwrap();
    let page3 = service.get_conversation(conversation_id, users.alice, 3, 10).await.unwrap();

    assert_eq!(page1.total_messages, 25);
    assert_eq!(page1.messages.first().unwrap().content, "m16");
    assert_eq!(page1.messages.last().unwrap().content, "m25");
    let contents: Vec<_> = page3.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m01", "m02", "m03", "m04", "m05"]);
}

#[tokio::test]
async fn test_get_or_create_with_unknown_user_is_not_found() {
    let users = seeded_users();
    let (service, store) = memory_service(&users);

    let err = service
        .get_or_create_conversation(users.alice, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.message(), "User not found");
    assert_eq!(store.conversation_count().await, 0);
}

#[tokio::test]
async fn test_failed_send_creates_no_conversation() {
    let users = seeded_users();
    let (service, store) = memory_service(&users);

    assert_matches!(
        service.send_message(users.alice, users.bob, "").await,
        Err(BackendError::Validation(_))
    );
    assert_eq!(store.conversation_count().await, 0);
}

#[tokio::test]
async fn test_configured_message_limit_applies() {
    let users = seeded_users();
    let store = Arc::new(dmrelay::backend::messaging::MemoryStore::new());
    let config = dmrelay::shared::AppConfig::builder()
        .max_message_length(5)
        .build()
        .unwrap();
    let service = MessagingService::new(store, users.directory.clone()).with_config(&config);

    assert!(service.send_message(users.alice, users.bob, "12345").await.is_ok());
    let err = service
        .send_message(users.alice, users.bob, "123456")
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Message content cannot exceed 5 characters");
}
