//! WebSocket real-time channel.
//!
//! Provides connection management, the broadcast gateway for job events,
//! heartbeat pings, and the HTTP upgrade handler.

pub mod gateway;
mod handler;
mod heartbeat;
pub mod manager;

pub use gateway::BroadcastGateway;
pub use handler::{dispatch, ws_handler};
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
