mod bridge;
mod config;
mod transport;
