//! `PING`/`PONG` (§4.E regime 3: `PING` is forwarded and arms `allow_pong`;
//! `PONG` is handled locally, never forwarded).

use async_trait::async_trait;
use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::PING(server, server2) = &message.command else {
            return Ok(());
        };
        ctx.session.allow_pong = true;
        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::PING(server.clone(), server2.clone()),
        })
    }
}

pub struct PongHandler;

#[async_trait]
impl Handler for PongHandler {
    async fn handle(&self, _ctx: &mut Context<'_>, _message: &Message) -> Result<(), HandlerError> {
        Ok(())
    }
}
