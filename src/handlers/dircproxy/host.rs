//! `DIRCPROXY HOST <addr> | NONE | (no arg)` (§4.E).

use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::handlers::dircproxy::require_gate;

pub fn run(ctx: &mut Context<'_>, args: &[String]) -> Result<(), HandlerError> {
    let allowed = ctx.session.class().map(|c| c.allow_host).unwrap_or(false);
    require_gate(ctx, allowed, "HOST")?;

    let (override_value, announcement) = match args.first().map(String::as_str) {
        Some("NONE") => (None, "No local address override; will bind as the OS chooses.".to_string()),
        Some(addr) => (Some(addr.to_string()), format!("Local address set to {addr}.")),
        None => (None, "Local address reset to the default.".to_string()),
    };

    ctx.session.local_address_override = override_value;
    ctx.session.reconnect_requested = true;
    ctx.notice(announcement)
}
