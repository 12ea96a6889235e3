//! `DIRCPROXY SERVERS` (§4.E): enumerate the class's server list, marking
//! the current cursor with `>`.

use crate::error::HandlerError;
use crate::handlers::core::Context;

pub fn run(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    let Some(class) = ctx.session.class().cloned() else {
        return Err(HandlerError::NotRegistered);
    };

    for (index, server) in class.servers.iter().enumerate() {
        let marker = if index == ctx.session.next_server { ">" } else { " " };
        ctx.notice(format!("{marker} {}: {}:{}", index + 1, server.host, server.port))?;
    }
    Ok(())
}
