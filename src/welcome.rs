//! Welcome/MOTD burst (§4.I), sent once a session's server connection
//! becomes `ACTIVE` and replayed on demand via `/DIRCPROXY MOTD`.

use chrono::Local;
use slirc_proto::{Command, Message, Prefix, Response};

use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::state::{ClientStatus, ServerStatus};

/// Runs the full welcome burst and sets `SENTWELCOME` (§4.I). Only valid to
/// call once `server_active() && is_fully_registered() && is_authed()` (the
/// `SENTWELCOME` invariant, §3).
pub async fn send_welcome(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    debug_assert!(ctx.session.server_active() && ctx.session.is_fully_registered() && ctx.session.is_authed());

    let nick = ctx.session.nickname.clone();
    let server = ctx.server_name().to_string();

    ctx.reply(Response::RPL_WELCOME, vec![nick.clone(), format!("Welcome to the network, {nick}")])?;
    ctx.reply(
        Response::RPL_YOURHOST,
        vec![nick.clone(), format!("Your host is {server}, running dircproxy-ng")],
    )?;
    ctx.reply(
        Response::RPL_CREATED,
        vec![
            nick.clone(),
            format!("This server was running since {}", Local::now().format("%a, %d %b %Y %H:%M:%S %z")),
        ],
    )?;
    ctx.reply(
        Response::RPL_MYINFO,
        vec![nick.clone(), server.clone(), "dircproxy-ng".to_string()],
    )?;

    send_motd(ctx)?;
    replay_modes(ctx)?;
    replay_away(ctx)?;
    rejoin_channels(ctx)?;
    autorecall_logs(ctx).await?;

    ctx.session.client_status.insert(ClientStatus::SENTWELCOME);
    Ok(())
}

/// Auto-recalls the session's own (server/private) log under the session's
/// nickname, then each active channel's log under its channel name,
/// mirroring the upstream's `irclog_autorecall` calls from
/// `ircclient_welcome` — one for `p->nickname`, one per non-`inactive`,
/// non-`unjoined` channel. How many lines (if any) come back is entirely the
/// log collaborator's own policy; this call site just asks for every
/// autorecall-eligible name in the burst.
async fn autorecall_logs(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    let session_key = ctx.session.nickname.clone();

    let own = ctx.log.autorecall(&session_key, &session_key).await;
    send_recalled(ctx, own)?;

    let channels: Vec<String> = ctx.session.channels.iter().filter(|c| !c.inactive && !c.unjoined).map(|c| c.name.clone()).collect();
    for name in channels {
        let recalled = ctx.log.autorecall(&session_key, &name).await;
        send_recalled(ctx, recalled)?;
    }
    Ok(())
}

fn send_recalled(ctx: &mut Context<'_>, lines: Vec<crate::contracts::LogLine>) -> Result<(), HandlerError> {
    let nick = ctx.session.nickname.clone();
    for line in lines {
        ctx.send_client(Message { tags: None, prefix: None, command: Command::NOTICE(nick.clone(), line.text) })?;
    }
    Ok(())
}

/// `375`/`372`…/`376`, or `422` when no MOTD is configured.
pub fn send_motd(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    let nick = ctx.session.nickname.clone();
    let lines = ctx.matrix.config.server.motd.clone();

    if lines.is_empty() {
        ctx.reply(Response::ERR_NOMOTD, vec![nick, "MOTD File is missing".to_string()])?;
        return Ok(());
    }

    ctx.reply(Response::RPL_MOTDSTART, vec![nick.clone(), format!("- {} Message of the Day -", ctx.server_name())])?;
    for line in &lines {
        ctx.reply(Response::RPL_MOTD, vec![nick.clone(), format!("- {line}")])?;
    }
    ctx.reply(Response::RPL_ENDOFMOTD, vec![nick, "End of /MOTD command.".to_string()])
}

fn replay_modes(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    if ctx.session.modes.is_empty() {
        return Ok(());
    }
    let nick = ctx.session.nickname.clone();
    ctx.send_client(Message {
        tags: None,
        prefix: Some(self_prefix(ctx)),
        command: Command::Raw("MODE".to_string(), vec![nick, ctx.session.modes.to_string()]),
    })
}

fn replay_away(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    let Some(away) = ctx.session.away_message.clone() else {
        return Ok(());
    };
    let nick = ctx.session.nickname.clone();
    ctx.reply(Response::RPL_NOWAWAY, vec![nick, away])
}

fn rejoin_channels(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    let prefix = self_prefix(ctx);
    let channels: Vec<String> = ctx.session.channels.iter().filter(|c| !c.inactive).map(|c| c.name.clone()).collect();
    for name in channels {
        ctx.send_client(Message {
            tags: None,
            prefix: Some(prefix.clone()),
            command: Command::JOIN(name.clone(), None, None),
        })?;
        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::Raw("TOPIC".to_string(), vec![name.clone()]),
        })?;
        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::Raw("NAMES".to_string(), vec![name]),
        })?;
    }
    Ok(())
}

fn self_prefix(ctx: &Context<'_>) -> Prefix {
    Prefix::Nickname(
        ctx.session.nickname.clone(),
        ctx.session.username.clone().unwrap_or_default(),
        ctx.session.visible_hostname.clone(),
    )
}

/// Whether becoming `ACTIVE` right now should trigger the welcome burst
/// (§4.E regime-2 transition: "If the server is ACTIVE, run Welcome").
pub fn should_welcome(ctx: &Context<'_>) -> bool {
    ctx.session.server_status.contains(ServerStatus::ACTIVE)
        && ctx.session.is_fully_registered()
        && ctx.session.is_authed()
        && !ctx.session.sent_welcome()
}
