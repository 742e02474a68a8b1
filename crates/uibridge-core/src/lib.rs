//! # uibridge-core
//!
//! Foundation types shared by every uibridge crate:
//!
//! - **Branded IDs**: [`CommandId`](ids::CommandId) and
//!   [`ConnectionId`](ids::ConnectionId) newtypes for type safety
//! - **Commands**: [`UiCommand`](command::UiCommand) — the immutable unit of
//!   work delivered to clients — plus the WebSocket wire frames around it
//! - **Logging**: `tracing` subscriber setup and an in-memory capture layer
//!   for asserting on emitted events in tests

#![deny(unsafe_code)]

pub mod command;
pub mod ids;
pub mod logging;
