//! `AWAY [msg]` (§4.E regime 3): update local away state, empty clears it, forward.

use async_trait::async_trait;
use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct AwayHandler;

#[async_trait]
impl Handler for AwayHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::AWAY(text) = &message.command else {
            return Ok(());
        };
        let text = text.clone().filter(|t| !t.is_empty());
        ctx.session.away_message = text.clone();
        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::AWAY(text),
        })
    }
}
