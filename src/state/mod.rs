//! Session and shared-registry state.

mod channel;
mod matrix;
mod mode;
mod nick;
mod session;

pub use channel::ChannelRecord;
pub use matrix::{AttachHandoff, Matrix, SessionHandle};
pub use mode::ModeSet;
pub use nick::{generate_nick, FALLBACK_NICKNAME};
pub use session::{ClientStatus, ProxySession, ServerStatus};
