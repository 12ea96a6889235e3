//! `RECALL [src] [from] <lines> | [src] ALL` (§4.E, §8 boundary case): source
//! disambiguation between a channel name and a nick-filter.

use slirc_proto::{Command, Message};

use crate::error::HandlerError;
use crate::handlers::core::Context;

pub async fn run(ctx: &mut Context<'_>, args: &[String]) -> Result<(), HandlerError> {
    let mut args = args.iter();
    let first = args.next().map(String::as_str);

    let is_known_channel = |name: &str| ctx.session.channels.iter().any(|c| c.name.eq_ignore_ascii_case(name));

    let (src, rest_first): (Option<String>, Option<&str>) = match first {
        Some(token) if is_known_channel(token) => (Some(token.to_string()), args.next().map(String::as_str)),
        other => (None, other),
    };

    let (start, lines) = match rest_first {
        Some("ALL") => (0, None),
        Some(token) if token.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
            let start: u64 = token.parse().unwrap_or(0);
            let lines = args.next().and_then(|s| s.parse::<u64>().ok());
            (start, lines)
        }
        Some(token) => {
            let lines = token.parse::<u64>().unwrap_or(0);
            (0, Some(lines))
        }
        None => (0, Some(20)),
    };

    let session_key = ctx.session.nickname.clone();
    let recalled = ctx.log.recall(&session_key, src.as_deref(), start, lines).await;
    for line in recalled {
        ctx.send_client(Message {
            tags: None,
            prefix: None,
            command: Command::NOTICE(ctx.session.nickname.clone(), line.text),
        })?;
    }
    Ok(())
}
