//! `QUIT` and Detach (§4.E "Detach"), shared by the client-originated `QUIT`
//! command and the `/DIRCPROXY DETACH`/`QUIT` subcommands.

use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::state::ClientStatus;

/// `QUIT [msg]` in regime 3: die-on-close tears everything down, otherwise
/// this is a genuine detach.
pub fn run_quit(ctx: &mut Context<'_>, message: Option<String>) -> Result<(), HandlerError> {
    if ctx.session.die_on_close {
        let text = message
            .or_else(|| ctx.session.class().and_then(|c| c.quit_message.clone()))
            .unwrap_or_else(|| "Client Quit".to_string());
        let _ = ctx.forward(raw(Command::QUIT(Some(text))));
        return Err(HandlerError::Quit(None));
    }
    run_detach(ctx, message)
}

/// Runs Detach steps 1-7, then signals the reactor to close the client side
/// only (step 8's socket close is the reactor's job, not this handler's).
pub fn run_detach(ctx: &mut Context<'_>, message: Option<String>) -> Result<(), HandlerError> {
    let class = ctx.session.class().cloned();
    let log_client = class.as_ref().map(|c| c.log_client).unwrap_or(true);
    if log_client {
        tracing::info!(nick = %ctx.session.nickname, "You disconnected");
    }

    if let Some(class) = &class {
        if let Some(template) = &class.detach_nickname {
            if ctx.session.server_active() {
                let new_nick = template.replace('*', &ctx.session.nickname);
                let _ = ctx.forward(raw(Command::NICK(new_nick.clone())));
                ctx.session.nickname = new_nick;
            }
        }

        if let Some(detach_message) = &class.detach_message {
            if ctx.session.server_active() {
                let text = match detach_message.strip_prefix("/me ") {
                    Some(rest) => format!("\u{1}ACTION {rest}\u{1}"),
                    None => detach_message.clone(),
                };
                let targets: Vec<String> = ctx
                    .session
                    .channels
                    .iter()
                    .filter(|c| !c.inactive && !c.unjoined)
                    .map(|c| c.name.clone())
                    .collect();
                for target in targets {
                    let _ = ctx.forward(raw(Command::PRIVMSG(target, text.clone())));
                }
            }
        }

        let away_text = message
            .clone()
            .or_else(|| (ctx.session.away_message.is_none()).then(|| class.away_message.clone()).flatten());
        if let Some(away_text) = away_text {
            ctx.session.away_message = Some(away_text.clone());
            if ctx.session.server_active() {
                let _ = ctx.forward(raw(Command::AWAY(Some(away_text))));
            }
        }

        if class.channel_leave_on_detach {
            let active_names: Vec<String> = ctx
                .session
                .channels
                .iter()
                .filter(|c| !c.inactive)
                .map(|c| c.name.clone())
                .collect();
            if ctx.session.server_active() {
                for name in &active_names {
                    let _ = ctx.forward(raw(Command::PART(name.clone(), None)));
                }
            }
            if class.channel_rejoin_on_attach {
                for channel in ctx.session.channels.iter_mut().filter(|c| !c.inactive) {
                    channel.mark_unjoined();
                }
            } else {
                ctx.session.channels.retain(|c| c.inactive);
            }
        }

        if !class.drop_modes.is_empty() {
            let drop_string = format!("-{}", class.drop_modes);
            if ctx.session.server_active() {
                let _ = ctx.forward(raw(Command::Raw(
                    "MODE".to_string(),
                    vec![ctx.session.nickname.clone(), drop_string],
                )));
            }
            ctx.session.modes.accumulate(&format!("-{}", class.drop_modes));
        }
    }

    ctx.session.client_status.remove(ClientStatus::CONNECTED | ClientStatus::AUTHED | ClientStatus::SENTWELCOME);
    Ok(())
}

fn raw(command: Command) -> Message {
    Message { tags: None, prefix: None, command }
}
