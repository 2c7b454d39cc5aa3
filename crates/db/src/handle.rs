//! Explicitly owned MongoDB connection handle (PRD-72).
//!
//! The client is established once by explicit action, reused across render
//! cycles, and reset on failure so the next action re-attempts connection.
//! At most one render is in flight at a time, so the handle needs no
//! coordination beyond the interior lock guarding connect/disconnect.

use std::time::Duration;

use bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tokio::sync::RwLock;

use crate::DbError;

/// Owned connection state with explicit `connect` / `disconnect` /
/// `is_connected` operations. Held behind an `Arc` in application state.
#[derive(Default)]
pub struct MongoHandle {
    client: RwLock<Option<Client>>,
}

impl MongoHandle {
    /// Create a handle with no connection established.
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish a client and verify it with a server round-trip.
    ///
    /// `timeout` bounds both server selection and the initial TCP connect,
    /// so no call here blocks past it. The handle only stores the client
    /// after the `ping` succeeds; a failed attempt leaves the previous
    /// state untouched.
    pub async fn connect(
        &self,
        uri: &str,
        timeout: Duration,
    ) -> Result<(), mongodb::error::Error> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;

        *self.client.write().await = Some(client);
        tracing::info!("MongoDB connection established");
        Ok(())
    }

    /// Drop the current client, if any. The next render must reconnect.
    pub async fn disconnect(&self) {
        if let Some(client) = self.client.write().await.take() {
            client.shutdown().await;
            tracing::info!("MongoDB connection closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Resolve the jobs collection on the current connection.
    ///
    /// Fails with [`DbError::NotConnected`] when no client is established;
    /// callers surface that as the connection banner rather than a query
    /// failure.
    pub async fn collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Collection<Document>, DbError> {
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or(DbError::NotConnected)?;
        Ok(client.database(database).collection(collection))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn fresh_handle_is_disconnected() {
        let handle = MongoHandle::new();
        assert!(!handle.is_connected().await);
    }

    #[tokio::test]
    async fn collection_requires_a_connection() {
        let handle = MongoHandle::new();
        let err = handle.collection("production-artifacts", "artifactJobs").await;
        assert_matches!(err, Err(DbError::NotConnected));
    }

    #[tokio::test]
    async fn disconnect_on_fresh_handle_is_a_no_op() {
        let handle = MongoHandle::new();
        handle.disconnect().await;
        assert!(!handle.is_connected().await);
    }
}
