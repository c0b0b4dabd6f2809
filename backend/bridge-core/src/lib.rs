//! Embedded-side control bridge for a host presentation.
//!
//! The embedded application announces itself over a [`MessagePort`], waits for
//! the host's `Init`, and from then on mirrors the host's attributes and room
//! state while relaying Magix events and navigation commands.

pub mod bridge;
pub mod config;
pub mod error;
pub mod transport;

pub(crate) mod locks;

#[cfg(test)]
mod tests;

pub use bridge::client::{BridgeClient, StateEvent, WeakBridgeClient};
pub use bridge::emitter::ListenerId;
pub use bridge::handshake::create_bridge;
pub use bridge::options::BridgeOptions;
pub use error::{BridgeError, ConfigError, TransportError};
pub use transport::{InboundMessage, MessagePort, Subscription, SubscriptionId};

/// Target origin that matches any peer.
pub const ANY_ORIGIN: &str = "*";
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 500;

pub const DEFAULT_HOST_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_HOST_PORT: u16 = 19876;
pub const DEFAULT_HOST_URL: &str = const_format::concatcp!(
    "ws://",
    DEFAULT_HOST_HOSTNAME,
    ":",
    DEFAULT_HOST_PORT
);
