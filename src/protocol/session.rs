//! Per-connection session state.

use crate::protocol::types::ClientInfo;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Session with the connected client.
pub struct ServerSession {
    initialized: AtomicBool,
    client_info: RwLock<Option<ClientInfo>>,
    protocol_version: RwLock<Option<String>>,
    request_count: AtomicU64,
}

impl ServerSession {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            client_info: RwLock::new(None),
            protocol_version: RwLock::new(None),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Record the handshake from an `initialize` request.
    pub fn set_client(&self, client_info: ClientInfo, protocol_version: String) {
        *self.client_info.write() = Some(client_info);
        *self.protocol_version.write() = Some(protocol_version);
    }

    /// Mark the handshake complete (`notifications/initialized`).
    pub fn set_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().clone()
    }

    pub fn protocol_version(&self) -> Option<String> {
        self.protocol_version.read().clone()
    }

    pub fn next_request_id(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }
}

impl Default for ServerSession {
    fn default() -> Self {
        Self::new()
    }
}
