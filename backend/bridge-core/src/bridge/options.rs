use crate::DEFAULT_HANDSHAKE_TIMEOUT_MS;

use std::time::Duration;

/// Tunables for [`create_bridge`](crate::create_bridge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// How long to wait for the host's `Init` after announcing.
    pub handshake_timeout: Duration,
    /// Apply `set_attributes` patches to the local mirror before the host
    /// echoes them. Off by default: the mirror only changes on host messages.
    pub optimistic_local_writes: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS),
            optimistic_local_writes: false,
        }
    }
}

impl BridgeOptions {
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_optimistic_local_writes(mut self, enabled: bool) -> Self {
        self.optimistic_local_writes = enabled;
        self
    }
}
