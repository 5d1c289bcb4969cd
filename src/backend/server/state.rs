/**
 * Application State Management
 *
 * `AppState` is the central state container shared by all handlers. The
 * `FromRef` implementations let handlers extract only the part they need,
 * e.g. `State(service): State<MessagingService>`.
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and safe to share: the service and gateway
 * hold their collaborators behind `Arc`, and the configuration is immutable.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::messaging::service::MessagingService;
use crate::backend::realtime::RealtimeGateway;
use crate::shared::AppConfig;

#[derive(Clone)]
pub struct AppState {
    /// Validated runtime configuration
    pub config: Arc<AppConfig>,

    /// Messaging operations used by REST handlers and the gateway
    pub messaging: MessagingService,

    /// Realtime connection lifecycle and fan-out
    pub gateway: RealtimeGateway,
}

impl FromRef<AppState> for MessagingService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.messaging.clone()
    }
}

impl FromRef<AppState> for RealtimeGateway {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gateway.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
