//! Shared primitives for the iframe bridge workspace.
//!
//! Every error type in the workspace records where it was raised through
//! [`ErrorLocation`], so a rendered error always ends with `[file:line:column]`.
//!
//! ## Architecture
//!
//! - **common** (this crate): cross-cutting primitives
//! - **models**: wire envelopes and mirrored state shapes
//! - **bridge-core**: handshake, bridge client, transports
//! - **bridge-probe**: smoke-test binary wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
