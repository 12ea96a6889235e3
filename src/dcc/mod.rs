//! DCC CHAT/SEND tunnelling (§4.E, §4.H).
//!
//! The session task rewrites outgoing `DCC CHAT`/`DCC SEND` CTCP tokens to
//! point at a locally bound relay listener ([`rewrite`]), then spawns a
//! relay ([`relay`]) that accepts exactly one peer connection and pipes
//! bytes between it and the real remote target named in the original token.

pub mod relay;
pub mod rewrite;

pub use relay::{run_chat_relay, run_send_relay, RelayKind};
pub use rewrite::{reject_ctcp, rewrite_dcc_token, DccOutcome};
