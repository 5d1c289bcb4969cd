/**
 * Server Initialization
 *
 * Builds the application state and router from a validated `AppConfig`.
 *
 * # Initialization Process
 *
 * 1. Open the SQLite database if `DATABASE_URL` is set (migrations included)
 * 2. Pick the message store and user directory: SQLite-backed when the
 *    database is available, in-memory otherwise
 * 3. Create the messaging service, presence registry and realtime gateway
 * 4. Create the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::auth::identity::{IdentityProvider, MemoryDirectory, SqlDirectory};
use crate::backend::messaging::{MemoryStore, MessageStore, MessagingService, SqlStore};
use crate::backend::presence::InMemoryPresence;
use crate::backend::realtime::RealtimeGateway;
use crate::backend::routes::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Assemble application state from explicit collaborators
///
/// Used by `create_app` and by tests that want to seed the store or
/// directory directly.
pub fn build_state(
    config: AppConfig,
    store: Arc<dyn MessageStore>,
    identity: Arc<dyn IdentityProvider>,
) -> AppState {
    let messaging = MessagingService::new(store, identity).with_config(&config);
    let gateway = RealtimeGateway::new(messaging.clone(), Arc::new(InMemoryPresence::new()))
        .with_outbound_buffer(config.outbound_buffer);

    AppState {
        config: Arc::new(config),
        messaging,
        gateway,
    }
}

/// Create and configure the Axum application
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!("Initializing dmrelay server");

    let (store, identity): (Arc<dyn MessageStore>, Arc<dyn IdentityProvider>) =
        match load_database(&config).await {
            Some(pool) => {
                tracing::info!("Using SQLite message store");
                (
                    Arc::new(SqlStore::new(pool.clone())),
                    Arc::new(SqlDirectory::new(pool)),
                )
            }
            None => {
                tracing::warn!("Using in-memory message store and an empty user directory");
                (Arc::new(MemoryStore::new()), Arc::new(MemoryDirectory::new()))
            }
        };

    let app_state = build_state(config, store, identity);
    let app = create_router(app_state);

    tracing::info!("Router configured");
    app
}
