//! Streaming server configuration and socket setup

pub mod config;
pub mod listener;

pub use config::{StreamConfig, DEFAULT_MAX_CLIENTS, LISTEN_BACKLOG};
pub use listener::bind_and_listen;
