pub mod session;

use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::{AppState, routes};

pub async fn health_check() -> &'static str {
    "OK"
}

/// Assembles the full application router. The session layer sits outside
/// everything else so handlers and the admin gate can always reach the
/// session. Cookies are not marked Secure because the service is expected
/// to run behind localhost or a TLS-terminating proxy.
pub fn router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes::pages::router())
        .nest("/admin", routes::admin::router())
        .nest_service("/uploads", ServeDir::new(state.storage().root()))
        .layer(session_layer)
        .with_state(state)
}
