//! Database resource shared through the lifespan context.

pub mod connection;
pub mod metrics;

pub use connection::Database;
pub use metrics::{ConnectionMetrics, ConnectionMetricsSnapshot};
