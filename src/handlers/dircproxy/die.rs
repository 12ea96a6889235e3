//! `DIRCPROXY DIE` (§4.E, §7 "fatal"): signal process-wide shutdown.

use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::handlers::dircproxy::require_gate;

pub fn run(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    let allowed = ctx.session.class().map(|c| c.allow_die).unwrap_or(false);
    require_gate(ctx, allowed, "DIE")?;

    ctx.notice("Shutting down.")?;
    let _ = ctx.matrix.shutdown.send(());
    Ok(())
}
