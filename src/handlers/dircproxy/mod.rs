//! The `/DIRCPROXY` extension command (§4.E), available in every regime and
//! gated per-subcommand by connection-class feature flags.

mod die;
mod help;
mod host;
mod jump;
mod motd;
mod persist;
mod quit;
mod recall;
mod servers;

use async_trait::async_trait;
use slirc_proto::{Command, Message, Response};

use crate::error::HandlerError;
use crate::handlers::core::{Context, Handler};

pub struct DircproxyHandler;

#[async_trait]
impl Handler for DircproxyHandler {
    async fn handle(&self, ctx: &mut Context<'_>, message: &Message) -> Result<(), HandlerError> {
        let Command::Raw(name, args) = &message.command else {
            return Ok(());
        };
        if !name.eq_ignore_ascii_case("DIRCPROXY") {
            return Ok(());
        }

        let Some((subcommand, rest)) = args.split_first() else {
            return Err(HandlerError::NeedMoreParams);
        };

        match subcommand.to_ascii_uppercase().as_str() {
            "RECALL" => recall::run(ctx, rest).await,
            "PERSIST" => persist::run(ctx, rest),
            "DETACH" => crate::detach::run_detach(ctx, rest.first().cloned()),
            "QUIT" => quit::run(ctx, rest),
            "MOTD" => motd::run(ctx),
            "DIE" => die::run(ctx),
            "SERVERS" => servers::run(ctx),
            "JUMP" | "CONNECT" => jump::run(ctx, rest),
            "HOST" => host::run(ctx, rest),
            "HELP" => help::run(ctx, rest),
            other => {
                ctx.reply(
                    Response::ERR_UNKNOWNCOMMAND,
                    vec![ctx.nick().to_string(), other.to_string(), "Unknown DIRCPROXY subcommand".to_string()],
                )
            }
        }
    }
}

/// Shared gate-check: reply `421` and short-circuit when a class flag forbids a subcommand.
fn require(ctx: &Context<'_>, allowed: bool, subcommand: &str) -> Result<(), HandlerError> {
    if allowed {
        return Ok(());
    }
    Err(HandlerError::AccessDenied).inspect_err(|_| {
        let _ = ctx.reply(
            Response::ERR_UNKNOWNCOMMAND,
            vec![ctx.nick().to_string(), subcommand.to_string(), "Not permitted".to_string()],
        );
    })
}

pub(crate) use require as require_gate;
