//! # uibridge-rpc
//!
//! The control-protocol surface of the command bridge:
//!
//! - **Wire types**: JSON-RPC 2.0 request/response envelopes
//! - **Action catalog**: the [`UiAction`](catalog::UiAction) trait and the
//!   fixed, discoverable set of named UI actions
//! - **Dispatcher**: method-routed handling of `initialize`, `tools/list`,
//!   `tools/call`, `resources/list`, and `resources/read`
//! - **Resource**: the read-only `config://server-status` document
//!
//! Command-emitting actions hand their [`UiCommand`](uibridge_core::command::UiCommand)
//! to a [`CommandSink`](catalog::CommandSink) — the delivery engine lives in
//! `uibridge-server` and plugs in behind that trait.

#![deny(unsafe_code)]

pub mod actions;
pub mod catalog;
pub mod dispatcher;
pub mod errors;
pub mod resource;
pub mod types;
