/**
 * Router Configuration
 *
 * Assembles the public routes, the authenticated API routes and the
 * cross-cutting layers into one Axum router.
 *
 * # Layers
 *
 * - `TraceLayer` - one span per request via `tracing`
 * - `CorsLayer` - permissive CORS so browser clients on other origins can
 *   reach the REST endpoints and the WebSocket
 */

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::messaging::handlers::health;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// - `GET /health` - unauthenticated liveness check
/// - everything in [`configure_api_routes`]
/// - JSON 404 fallback
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));
    let router = configure_api_routes(router, &app_state);

    router
        .fallback(|| async {
            crate::backend::error::BackendError::not_found("Route not found")
        })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
