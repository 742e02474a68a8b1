//! WebSocket transport and the command delivery core.

pub mod connection;
pub mod delivery;
pub mod heartbeat;
pub mod queue;
pub mod registry;
pub mod session;
