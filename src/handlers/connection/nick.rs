//! `NICK`: accepted pre-auth without forwarding, forwarded once the server
//! side is live (§4.E regimes 1 and 3).

use async_trait::async_trait;
use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};
use crate::state::ClientStatus;

pub struct NickHandler;

#[async_trait]
impl Handler for NickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::NICK(nick) = &message.command else {
            return Ok(());
        };

        if nick.is_empty() {
            return Err(HandlerError::NoNicknameGiven);
        }
        if *nick == ctx.session.nickname {
            return Ok(());
        }

        let changed = !ctx.session.nickname.is_empty();
        ctx.session.nickname = nick.clone();
        ctx.session.client_status.insert(ClientStatus::GOTNICK);

        if ctx.session.server_active() && changed {
            ctx.forward(Message {
                tags: None,
                prefix: None,
                command: Command::NICK(nick.clone()),
            })?;
        }

        Ok(())
    }
}
