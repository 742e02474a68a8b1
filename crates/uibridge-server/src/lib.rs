//! # uibridge-server
//!
//! The bridge's network surface and delivery core: server configuration,
//! the connection registry, the bounded pending queue, the delivery worker,
//! WebSocket session handling, and the axum router.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod ws;
