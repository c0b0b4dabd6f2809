//! Bridge protocol: handshake, client state machine, and the pieces it is
//! built from.

pub mod client;
pub mod emitter;
pub mod gate;
pub mod handshake;
pub mod options;
pub mod origin;
pub mod registry;
