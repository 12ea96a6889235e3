//! Client-originated `QUIT` (§4.E regime 3: "run Detach with die_on_close path").

use async_trait::async_trait;
use slirc_proto::{Command, Message};

use crate::detach::run_quit;
use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::QUIT(reason) = &message.command else {
            return Ok(());
        };
        run_quit(ctx, reason.clone())
    }
}
