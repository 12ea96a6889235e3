//! `PERSIST` (§4.E): flips a `die_on_close` session (detached under inetd, or
//! merely configured to die on detach) into one that survives disconnect.

use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::handlers::dircproxy::require_gate;

pub fn run(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), HandlerError> {
    let allowed = ctx.session.class().map(|c| c.allow_persist).unwrap_or(false);
    require_gate(ctx, allowed, "PERSIST")?;

    if ctx.session.die_on_close {
        ctx.session.die_on_close = false;
        ctx.notice("This session is now persistent.")?;
    } else {
        ctx.notice("This session is already persistent.")?;
    }
    Ok(())
}
