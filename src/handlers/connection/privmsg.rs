//! `PRIVMSG` (§4.E regime 3): CTCP-scan, rewrite/relay outgoing DCC tokens,
//! log ACTION and other CTCPs, reset the idle timer, forward the result.

use std::time::Duration;

use async_trait::async_trait;
use slirc_proto::ctcp::CtcpKind;
use slirc_proto::{Command, Message, Prefix};

use crate::ctcp::{reassemble, scan, Segment};
use crate::dcc::{reject_ctcp, rewrite_dcc_token, run_chat_relay, run_send_relay, DccOutcome};
use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::PRIVMSG(target, body) = &message.command else {
            return Ok(());
        };

        let rewritten_body = rewrite_outgoing_ctcp(ctx, target, body)?;

        if rewritten_body.is_empty() {
            return Ok(());
        }

        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::PRIVMSG(target.clone(), rewritten_body),
        })
    }
}

/// Scans `body` for CTCP tokens, rewriting/relaying `DCC CHAT`/`DCC SEND`
/// and logging everything else, returning the reassembled text.
pub(super) fn rewrite_outgoing_ctcp(ctx: &mut Context<'_>, target: &str, body: &str) -> Result<String, HandlerError> {
    let Some(class) = ctx.session.class().cloned() else {
        return Ok(body.to_string());
    };

    let mut segments = scan(body);
    for segment in &mut segments {
        let Segment::Ctcp(ctcp) = segment else { continue };

        if ctcp.kind == CtcpKind::Action || class.log_ctcp {
            tracing::debug!(nick = %ctx.session.nickname, target, ctcp = %ctcp, "ctcp traffic");
        }

        match rewrite_dcc_token(ctcp, &class, ctx.matrix, ctx.local_addr) {
            DccOutcome::Unchanged | DccOutcome::SilentSkip => {}
            DccOutcome::Rewritten { ctcp: rewritten, listen_port, remote, is_send } => {
                spawn_relay(ctx, listen_port, remote, is_send, &class);
                *ctcp = rewritten;
            }
            DccOutcome::Reject { subcommand, name } => {
                if class.dcc.proxy_sendreject {
                    let notice = reject_ctcp(&subcommand, &name);
                    let _ = ctx.send_client(Message {
                        tags: None,
                        prefix: Some(Prefix::ServerName(ctx.server_name().to_string())),
                        command: Command::NOTICE(ctx.session.nickname.clone(), notice.to_string()),
                    });
                }
                *segment = Segment::Text(String::new());
            }
        }
    }

    Ok(reassemble(&segments))
}

fn spawn_relay(ctx: &Context<'_>, listen_port: u16, remote: std::net::SocketAddr, is_send: bool, class: &crate::config::ClassConfig) {
    let Some(local_addr) = ctx.local_addr else { return };
    let matrix = std::sync::Arc::clone(ctx.matrix);
    let idle_timeout = Duration::from_secs(class.dcc.idle_timeout);
    let send_fast = class.dcc.send_fast;
    matrix.metrics.dcc_relays_opened.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind((local_addr.ip(), listen_port)).await {
            Ok(listener) => listener,
            Err(error) => {
                tracing::warn!(listen_port, %error, "failed to bind dcc relay listener");
                matrix.release_dcc_port(listen_port);
                return;
            }
        };
        if is_send {
            run_send_relay(listener, remote, send_fast, idle_timeout, matrix, listen_port).await;
        } else {
            run_chat_relay(listener, remote, idle_timeout, matrix, listen_port).await;
        }
    });
}
