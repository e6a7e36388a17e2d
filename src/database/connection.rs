//! Shared database handle.

use crate::config::DatabaseConfig;
use crate::database::metrics::{ConnectionMetrics, ConnectionMetricsSnapshot};
use crate::error::{DatabaseError, DbResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

/// A long-lived database connection shared by every request.
///
/// Handlers only get `&Database`; closing it is reserved to the lifespan that opened it.
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    connected: AtomicBool,
    metrics: ConnectionMetrics,
}

impl Database {
    /// Open a connection, failing if the handshake exceeds `connect_timeout`.
    #[instrument(skip(config), fields(database = %config.name))]
    pub async fn connect(config: DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to database {}", config.name);

        let handshake = tokio::time::sleep(config.latency);
        if tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .is_err()
        {
            warn!("Connection to {} timed out", config.name);
            return Err(DatabaseError::Timeout(
                config.connect_timeout.as_millis() as u64
            ));
        }

        let metrics = ConnectionMetrics::new();
        metrics.record_connect();
        info!("Connected to database {}", config.name);

        Ok(Self {
            config,
            connected: AtomicBool::new(true),
            metrics,
        })
    }

    /// Close the connection. Only the first call succeeds.
    pub(crate) async fn disconnect(&self) -> DbResult<()> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Err(DatabaseError::DisconnectFailed(format!(
                "connection to {} already closed",
                self.config.name
            )));
        }

        self.metrics.record_disconnect();
        info!("Disconnected from database {}", self.config.name);
        Ok(())
    }

    /// Run a query against the live connection.
    pub async fn query(&self) -> DbResult<String> {
        if !self.is_connected() {
            self.metrics.record_query_error();
            return Err(DatabaseError::NotConnected);
        }

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        // The connection may have been closed while the query was in flight.
        if !self.is_connected() {
            self.metrics.record_query_error();
            return Err(DatabaseError::QueryFailed(
                "connection closed during query".into(),
            ));
        }

        self.metrics.record_query_executed();
        debug!("Query executed on {}", self.config.name);
        Ok("Query result".to_string())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn metrics(&self) -> ConnectionMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfigBuilder;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_query_disconnect() {
        let db = Database::connect(DatabaseConfig::default()).await.unwrap();
        assert!(db.is_connected());
        assert_eq!(db.query().await.unwrap(), "Query result");

        db.disconnect().await.unwrap();
        assert!(!db.is_connected());
        assert!(matches!(db.query().await, Err(DatabaseError::NotConnected)));

        let metrics = db.metrics();
        assert_eq!(metrics.connects, 1);
        assert_eq!(metrics.disconnects, 1);
        assert_eq!(metrics.queries_executed, 1);
        assert_eq!(metrics.query_errors, 1);
    }

    #[tokio::test]
    async fn test_disconnect_twice_fails() {
        let db = Database::connect(DatabaseConfig::default()).await.unwrap();
        db.disconnect().await.unwrap();
        assert!(matches!(
            db.disconnect().await,
            Err(DatabaseError::DisconnectFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let config = DatabaseConfigBuilder::new()
            .latency(Duration::from_millis(200))
            .connect_timeout(Duration::from_millis(10))
            .build()
            .unwrap();

        let result = Database::connect(config).await;
        assert!(matches!(result, Err(DatabaseError::Timeout(10))));
    }
}
