//! Central dispatch: the four client regimes of §4.E, delegating to the
//! per-command handlers in [`connection`] and the `/DIRCPROXY` tree.

pub mod connection;
pub mod core;
pub mod dircproxy;

use slirc_proto::{Command, Message, Response};

use crate::error::HandlerError;
use crate::welcome;
use connection::{AwayHandler, MotdHandler, NickHandler, NoticeHandler, PassHandler, PingHandler, PongHandler, PrivmsgHandler, QuitHandler, UserHandler};
use core::{Context, Handler};
use dircproxy::DircproxyHandler;

/// Dispatches one client-originated line and, if it just completed the
/// welcome invariant's preconditions, runs the welcome burst.
pub async fn dispatch(ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
    ctx.matrix.metrics.commands_dispatched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let is_dircproxy = matches!(&message.command, Command::Raw(name, _) if name.eq_ignore_ascii_case("DIRCPROXY"));

    let result = if is_dircproxy {
        DircproxyHandler.handle(ctx, message).await
    } else if !ctx.session.is_authed() {
        regime1(ctx, message).await
    } else if !ctx.session.is_fully_registered() {
        regime2(ctx, message).await
    } else if ctx.session.server_active() {
        regime3(ctx, message).await
    } else {
        regime4(ctx)
    };

    if result.is_ok() && welcome::should_welcome(ctx) {
        welcome::send_welcome(ctx).await?;
    }
    result
}

/// Regime 1 — unauthenticated.
async fn regime1(ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
    match &message.command {
        Command::PASS(_) => PassHandler.handle(ctx, message).await,
        Command::NICK(_) => NickHandler.handle(ctx, message).await,
        _ => ctx.notice("Please send /QUOTE PASS <password> first."),
    }
}

/// Regime 2 — authed, not yet fully registered.
async fn regime2(ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
    match &message.command {
        Command::NICK(_) => NickHandler.handle(ctx, message).await,
        Command::USER(..) => UserHandler.handle(ctx, message).await,
        _ => ctx.notice("Please complete registration with NICK and USER first."),
    }
}

/// Regime 3 — fully connected, server `ACTIVE`. Defaults to forwarded.
async fn regime3(ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
    match &message.command {
        Command::PASS(_) | Command::USER(..) | Command::Response(..) => Ok(()),
        Command::PONG(..) => PongHandler.handle(ctx, message).await,
        Command::QUIT(_) => QuitHandler.handle(ctx, message).await,
        Command::NICK(_) => NickHandler.handle(ctx, message).await,
        Command::AWAY(_) => AwayHandler.handle(ctx, message).await,
        Command::MOTD(_) => MotdHandler.handle(ctx, message).await,
        Command::PING(..) => PingHandler.handle(ctx, message).await,
        Command::PRIVMSG(..) => PrivmsgHandler.handle(ctx, message).await,
        Command::NOTICE(..) => NoticeHandler.handle(ctx, message).await,
        _ => ctx.forward(message.clone()),
    }
}

/// Regime 4 — server not yet `ACTIVE`: everything gets `263`.
fn regime4(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    ctx.reply(
        Response::RPL_TRYAGAIN,
        vec![ctx.nick().to_string(), "Please wait a while and try again.".to_string()],
    )
}
