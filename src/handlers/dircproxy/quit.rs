//! `DIRCPROXY QUIT [msg]` (§4.E): unconditional shutdown, unlike the
//! plain client `QUIT` which may merely detach.

use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::Context;

pub fn run(ctx: &mut Context<'_>, args: &[String]) -> Result<(), HandlerError> {
    let text = args
        .first()
        .cloned()
        .or_else(|| ctx.session.class().and_then(|c| c.quit_message.clone()))
        .unwrap_or_else(|| "Client Quit".to_string());

    if ctx.session.server_active() {
        let _ = ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::QUIT(Some(text)),
        });
    }
    Err(HandlerError::Quit(None))
}
