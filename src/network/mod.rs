//! Network module: the [`Gateway`] TCP listener and the per-session
//! [`SessionTask`] reactor it spawns for each accepted client.

mod gateway;
mod session;

pub use gateway::Gateway;
pub use session::SessionTask;
