//! Core handler infrastructure: the [`Context`] every handler receives and
//! the [`Handler`] trait each command implements.

pub mod context;

pub use context::Context;

use async_trait::async_trait;
use slirc_proto::Message;

use crate::error::HandlerError;

/// One IRC command's behaviour against a live session.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError>;
}
