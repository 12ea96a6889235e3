//! `DIRCPROXY HELP [cmd]` (§4.E): canned help text, index gated per class.

use crate::error::HandlerError;
use crate::handlers::core::Context;

struct HelpPage {
    name: &'static str,
    text: &'static str,
    gate: fn(&crate::config::ClassConfig) -> bool,
}

const PAGES: &[HelpPage] = &[
    HelpPage { name: "RECALL", text: "RECALL [src] [from] <lines> | [src] ALL - replay logged lines.", gate: |_| true },
    HelpPage { name: "PERSIST", text: "PERSIST - keep this session alive after you disconnect.", gate: |c| c.allow_persist },
    HelpPage { name: "DETACH", text: "DETACH [away] - disconnect but keep the server session running.", gate: |_| true },
    HelpPage { name: "QUIT", text: "QUIT [msg] - end the server session and disconnect.", gate: |_| true },
    HelpPage { name: "MOTD", text: "MOTD - show the message of the day.", gate: |_| true },
    HelpPage { name: "DIE", text: "DIE - shut down the proxy.", gate: |c| c.allow_die },
    HelpPage { name: "SERVERS", text: "SERVERS - list this class's configured servers.", gate: |_| true },
    HelpPage { name: "JUMP", text: "JUMP|CONNECT <n|host[:port[:pass]]> - switch servers.", gate: |c| c.allow_jump },
    HelpPage { name: "HOST", text: "HOST <addr>|NONE - set the local bind address.", gate: |c| c.allow_host },
];

pub fn run(ctx: &mut Context<'_>, args: &[String]) -> Result<(), HandlerError> {
    let class = ctx.session.class().cloned();
    let permitted = |page: &&HelpPage| class.as_ref().map(|c| (page.gate)(c)).unwrap_or(true);

    if let Some(name) = args.first() {
        match PAGES.iter().find(|p| p.name.eq_ignore_ascii_case(name) && permitted(p)) {
            Some(page) => ctx.notice(page.text),
            None => ctx.notice(format!("No help available for {name}.")),
        }
    } else {
        for page in PAGES.iter().filter(permitted) {
            ctx.notice(format!("{:<8} {}", page.name, page.text))?;
        }
        Ok(())
    }
}
