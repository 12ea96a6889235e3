//! `MOTD` in regime 3: arms `allow_motd` and forwards upstream (§4.E); the
//! proxy's own rendered MOTD is [`crate::welcome`]'s concern, reached via
//! `/DIRCPROXY MOTD`.

use async_trait::async_trait;
use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct MotdHandler;

#[async_trait]
impl Handler for MotdHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::MOTD(target) = &message.command else {
            return Ok(());
        };
        ctx.session.allow_motd = true;
        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::MOTD(target.clone()),
        })
    }
}
