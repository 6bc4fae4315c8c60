use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via
/// `State<AppState>`. Cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: atrium_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus for governance events (fire-and-forget).
    pub event_bus: Arc<atrium_events::EventBus>,
}
