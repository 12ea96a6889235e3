//! `DIRCPROXY MOTD` (§4.E): render the proxy's own MOTD immediately.

use crate::error::HandlerError;
use crate::handlers::core::Context;
use crate::welcome::send_motd;

pub fn run(ctx: &mut Context<'_>) -> Result<(), HandlerError> {
    send_motd(ctx)
}
