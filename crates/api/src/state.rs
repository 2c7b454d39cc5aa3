use std::sync::Arc;

use jobscope_core::catalog::TypeCatalog;
use jobscope_db::MongoHandle;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`. The MongoDB handle is
/// the only mutable resource; the catalog and configuration are read-only
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Explicitly managed MongoDB connection.
    pub mongo: Arc<MongoHandle>,
    /// Artifact type catalog, loaded once at startup.
    pub catalog: Arc<TypeCatalog>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
