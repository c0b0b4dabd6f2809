mod client;
mod follower;
mod handshake;
mod lifecycle;
