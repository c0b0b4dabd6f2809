//! Wire and state models for the iframe control bridge.
//!
//! This crate holds pure data: the tagged envelope exchanged with the host
//! peer, the payload shapes carried inside it, and the patch rule used to
//! reconcile mirrored state. There is no I/O here; the bridge client in
//! `bridge-core` owns the mirrors and decides when these rules run.

pub mod envelope;
pub mod error;
pub mod init;
pub mod magix;
pub mod patch;
pub mod room_state;

pub use envelope::{Envelope, MessageKind};
pub use error::model_error::ModelError;
pub use init::InitPayload;
pub use magix::MagixEventPayload;
pub use patch::{ABSENT, Attributes, Patch, apply_patch};
pub use room_state::RoomState;

#[cfg(test)]
mod tests;
