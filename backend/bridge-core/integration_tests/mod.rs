mod bridge;
mod error;
mod host_tests;
mod ws;
