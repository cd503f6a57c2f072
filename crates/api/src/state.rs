use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is an `Arc` internally, the config is wrapped
/// in one here.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pecha_db::DbPool,
    /// Server configuration (JWT settings, lock timeout, CORS origins).
    pub config: Arc<ServerConfig>,
}
