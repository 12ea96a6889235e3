//! `DIRCPROXY JUMP|CONNECT <n|host[:port[:pass]]>` (§4.E).

use crate::config::ServerEntry;
use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::handlers::dircproxy::require_gate;

pub fn run(ctx: &mut Context<'_>, args: &[String]) -> Result<(), HandlerError> {
    let allowed = ctx.session.class().map(|c| c.allow_jump).unwrap_or(false);
    require_gate(ctx, allowed, "JUMP")?;

    let Some(target) = args.first() else {
        return Err(HandlerError::NeedMoreParams);
    };
    let Some(class) = ctx.session.class() else {
        return Err(HandlerError::NotRegistered);
    };
    let allow_new = class.allow_jump_new;

    let by_index = target
        .parse::<usize>()
        .ok()
        .filter(|index| *index >= 1 && *index <= class.servers.len())
        .map(|index| index - 1);
    let by_name = class.servers.iter().position(|s| s.host == *target);

    let (index, announcement) = match by_index.or(by_name) {
        Some(index) => (index, format!("Jumping to server {}.", index + 1)),
        None if allow_new => {
            let mut parts = target.splitn(3, ':');
            let host = parts.next().unwrap_or(target).to_string();
            let port: u16 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(6667);
            let password = parts.next().map(str::to_string);
            let announcement = format!("Added and jumping to {host}:{port}.");
            let class = ctx.session.class_mut().expect("checked above");
            class.servers.push(ServerEntry { host, port, password });
            (class.servers.len() - 1, announcement)
        }
        None => return Err(HandlerError::AccessDenied),
    };

    ctx.session.next_server = index;
    ctx.session.reconnect_requested = true;
    ctx.notice(announcement)
}
