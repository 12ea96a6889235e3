//! `PASS` and the authentication algorithm it triggers (§4.D, §4.E
//! "Authentication").

use async_trait::async_trait;
use slirc_proto::{Command, Message, Prefix, Response};

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};
use crate::state::ClientStatus;

pub struct PassHandler;

#[async_trait]
impl Handler for PassHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::PASS(password) = &message.command else {
            return Ok(());
        };

        if ctx.session.is_authed() {
            return Err(HandlerError::AlreadyRegistered);
        }
        if password.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }

        let hostname = ctx.session.hostname.clone();
        let matched = ctx
            .matrix
            .config
            .matching_classes(password, &hostname)
            .next()
            .cloned();

        let Some(class) = matched else {
            send_error(ctx, "Bad Password")?;
            ctx.reply(
                Response::ERR_PASSWDMISMATCH,
                vec!["*".to_string(), "Password incorrect".to_string()],
            )?;
            return Err(HandlerError::AuthFailed);
        };

        if let Some(existing) = ctx.matrix.fetch_class(&class.name) {
            let connected = existing.connected.load(std::sync::atomic::Ordering::Acquire);
            if connected && !class.disconnect_existing {
                drop(existing);
                send_error(ctx, "Already connected")?;
                return Err(HandlerError::AuthFailed);
            }
            drop(existing);

            // Reattach (§4.E "Authentication", step 2): a live-or-detached
            // session is already bound to this class. This connection's
            // socket belongs to it now, not to a session of its own — the
            // reactor hands it off once dispatch returns. If it was still
            // connected, the handoff evicts its current client first
            // ("disconnect_existing"); if it was already detached, this is
            // a plain reattach.
            ctx.session.attach_to = Some(class.name);
            return Ok(());
        }

        ctx.session.bind_class(class);
        ctx.session.client_status.insert(ClientStatus::AUTHED);
        ctx.matrix.metrics.sessions_attached.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }
}

fn send_error(ctx: &Context<'_>, text: &str) -> Result<(), HandlerError> {
    ctx.send_client(error_message(ctx.server_name(), text))
}

fn error_message(server_name: &str, text: &str) -> Message {
    Message {
        tags: None,
        prefix: Some(Prefix::ServerName(server_name.to_string())),
        command: Command::ERROR(text.to_string()),
    }
}
