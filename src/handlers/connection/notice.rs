//! `NOTICE` (§4.E regime 3): same logging rules as `PRIVMSG`, no DCC
//! rewriting.

use async_trait::async_trait;
use slirc_proto::ctcp::CtcpKind;
use slirc_proto::{Command, Message};

use crate::ctcp::scan;
use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct NoticeHandler;

#[async_trait]
impl Handler for NoticeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::NOTICE(target, body) = &message.command else {
            return Ok(());
        };

        let log_ctcp = ctx.session.class().map(|c| c.log_ctcp).unwrap_or(false);
        for segment in scan(body) {
            if let crate::ctcp::Segment::Ctcp(ctcp) = segment {
                if ctcp.kind == CtcpKind::Action || log_ctcp {
                    tracing::debug!(nick = %ctx.session.nickname, target, ctcp = %ctcp, "ctcp traffic");
                }
            }
        }

        ctx.forward(Message {
            tags: None,
            prefix: None,
            command: Command::NOTICE(target.clone(), body.clone()),
        })
    }
}
