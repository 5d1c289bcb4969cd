//! Service, gateway and app fixtures

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::mpsc;
use uuid::Uuid;

use dmrelay::backend::auth::identity::{MemoryDirectory, UserProfile};
use dmrelay::backend::auth::sessions::create_token;
use dmrelay::backend::messaging::{MemoryStore, MessagingService};
use dmrelay::backend::presence::InMemoryPresence;
use dmrelay::backend::realtime::RealtimeGateway;
use dmrelay::backend::routes::create_router;
use dmrelay::backend::server::build_state;
use dmrelay::shared::{AppConfig, ServerEvent};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Two named users plus a directory containing them
pub struct Users {
    pub directory: Arc<MemoryDirectory>,
    pub alice: Uuid,
    pub bob: Uuid,
}

pub fn seeded_users() -> Users {
    let directory = Arc::new(MemoryDirectory::new());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    directory.insert(UserProfile::new(alice, "Alice", "Archer"));
    directory.insert(UserProfile::new(bob, "Bob", "Baker"));
    Users {
        directory,
        alice,
        bob,
    }
}

/// Add one more user to `users`' directory
pub fn add_user(users: &Users, first: &str, last: &str) -> Uuid {
    let id = Uuid::new_v4();
    users.directory.insert(UserProfile::new(id, first, last));
    id
}

pub fn memory_service(users: &Users) -> (MessagingService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = MessagingService::new(store.clone(), users.directory.clone());
    (service, store)
}

pub fn memory_gateway(users: &Users) -> RealtimeGateway {
    let (service, _) = memory_service(users);
    RealtimeGateway::new(service, Arc::new(InMemoryPresence::new()))
}

pub fn test_config() -> AppConfig {
    AppConfig::builder()
        .jwt_secret(TEST_SECRET)
        .build()
        .expect("valid test config")
}

/// Router over the in-memory store and `users`' directory
pub fn test_app(users: &Users) -> Router {
    let state = build_state(
        test_config(),
        Arc::new(MemoryStore::new()),
        users.directory.clone(),
    );
    create_router(state)
}

pub fn bearer(user_id: Uuid) -> String {
    let token = create_token(user_id, TEST_SECRET, 3600).expect("token");
    format!("Bearer {}", token)
}

/// Next event on a connection queue, failing the test after one second
pub async fn next_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("connection queue closed")
}

/// Assert nothing is queued for a connection
pub fn assert_no_event(rx: &mut mpsc::Receiver<ServerEvent>) {
    if let Ok(event) = rx.try_recv() {
        panic!("unexpected event: {:?}", event);
    }
}
