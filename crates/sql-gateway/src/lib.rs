//! Read-only SQL gateway for agent action groups.
//!
//! An inbound envelope is normalized into a request, its SQL is gated to a
//! single SELECT with a bounded `LIMIT`, executed against a
//! [`backend::QueryBackend`], and the result is wrapped into the fixed
//! response envelope. Failures of any kind surface as an empty result set.

pub mod adapters;
pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod logging;

pub use config::GatewayConfig;
pub use error::{AppError, AppResult};
pub use gateway::Gateway;
