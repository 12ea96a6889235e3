//! `USER`: stores username/realname and the RFC 2812 mode bitmask, including
//! the upstream's verbatim-preserved bit-3 quirk (§4.E regime 2, §9).

use async_trait::async_trait;
use slirc_proto::Command;

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};
use crate::state::ClientStatus;

pub struct UserHandler;

#[async_trait]
impl Handler for UserHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &slirc_proto::Message) -> Result<(), HandlerError> {
        let Command::USER(username, mode, realname) = &message.command else {
            return Ok(());
        };
        if !ctx.session.is_authed() {
            return Err(HandlerError::NotRegistered);
        }
        if username.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }

        ctx.session.username = Some(username.clone());
        ctx.session.realname = Some(realname.clone());

        // Bit 2 -> +w, bit 3 -> +w too: both source-observed behaviours are
        // kept, bit 3 is not +i here.
        if let Ok(bits) = mode.parse::<u32>() {
            if bits & 0b0100 != 0 {
                ctx.session.modes.accumulate("+w");
            }
            if bits & 0b1000 != 0 {
                ctx.session.modes.accumulate("+w");
            }
        }

        // Idempotent: a client re-sending USER before NICK doesn't flip
        // GOTUSER twice in any way that matters.
        ctx.session.client_status.insert(ClientStatus::GOTUSER);

        Ok(())
    }
}
