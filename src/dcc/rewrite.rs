//! Outgoing DCC CTCP rewriting (§4.E, SUPPLEMENTED FEATURES in
//! `SPEC_FULL.md`), ported from the upstream PRIVMSG handler's CTCP branch.

use std::net::{Ipv4Addr, SocketAddr};

use slirc_proto::ctcp::{CtcpKind, CtcpOwned};

use crate::config::ClassConfig;
use crate::state::Matrix;

/// What to do with one DCC CTCP token after attempting to proxy it.
pub enum DccOutcome {
    /// Not a DCC CHAT/SEND token, or the class doesn't proxy DCC: pass
    /// through unchanged.
    Unchanged,
    /// The rewritten token to substitute in place of the original, plus
    /// what the caller needs to actually stand up the relay.
    Rewritten {
        ctcp: CtcpOwned,
        listen_port: u16,
        remote: SocketAddr,
        is_send: bool,
    },
    /// `getsockname` failed before any other check ran: the upstream
    /// falls through to generic-CTCP handling. Not a REJECT.
    SilentSkip,
    /// Proxy setup failed after a local address was obtained. Elide the
    /// token; emit a `DCC REJECT` notice only if the class asks for one.
    Reject { subcommand: String, name: String },
}

/// Attempt to proxy one DCC token. `local_addr` is the server-side
/// socket's local address (`getsockname`); `None` means that call failed.
pub fn rewrite_dcc_token(ctcp: &CtcpOwned, class: &ClassConfig, matrix: &Matrix, local_addr: Option<SocketAddr>) -> DccOutcome {
    if ctcp.kind != CtcpKind::Dcc || !class.dcc.proxy_outgoing {
        return DccOutcome::Unchanged;
    }
    let Some(params) = ctcp.params.as_deref() else {
        return DccOutcome::Unchanged;
    };
    let fields: Vec<&str> = params.split(' ').collect();
    if fields.len() < 4 {
        return DccOutcome::Unchanged;
    }
    let subcommand = fields[0].to_ascii_uppercase();
    if subcommand != "CHAT" && subcommand != "SEND" {
        return DccOutcome::Unchanged;
    }
    let name = fields[1].to_string();
    let rest = if fields.len() >= 5 { format!(" {}", fields[4]) } else { String::new() };

    // getsockname must succeed before anything else is even attempted.
    let Some(local_addr) = local_addr else {
        return DccOutcome::SilentSkip;
    };

    let (remote_addr, remote_port) = match class.dcc.tunnel_outgoing {
        Some(tunnel_port) => (Ipv4Addr::LOCALHOST, tunnel_port),
        None => {
            let Ok(addr_u32) = fields[2].parse::<u32>() else {
                return DccOutcome::Unchanged;
            };
            let Ok(port) = fields[3].parse::<u16>() else {
                return DccOutcome::Unchanged;
            };
            (Ipv4Addr::from(addr_u32), port)
        }
    };
    let Some(listen_port) = matrix.allocate_dcc_port(class.dcc.port_range) else {
        return DccOutcome::Reject { subcommand, name };
    };

    let local_u32 = match local_addr {
        SocketAddr::V4(v4) => u32::from(*v4.ip()),
        SocketAddr::V6(_) => {
            matrix.release_dcc_port(listen_port);
            return DccOutcome::SilentSkip;
        }
    };

    DccOutcome::Rewritten {
        ctcp: CtcpOwned {
            kind: CtcpKind::Dcc,
            params: Some(format!("{subcommand} {name} {local_u32} {listen_port}{rest}")),
        },
        listen_port,
        remote: SocketAddr::from((remote_addr, remote_port)),
        is_send: subcommand == "SEND",
    }
}

/// Build the inline `DCC REJECT` notice text sent directly to the client
/// (not the CTCP-wrapped form — this is the full NOTICE body).
pub fn reject_ctcp(subcommand: &str, name: &str) -> CtcpOwned {
    CtcpOwned {
        kind: CtcpKind::Unknown("REJECT".to_string()),
        params: Some(format!("{subcommand} {name} (unable to proxy)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_with_proxy(send_fast: bool) -> ClassConfig {
        let mut class: ClassConfig = toml::from_str(
            r#"
            name = "default"
            password = "x"
            servers = [{ host = "irc.example.net", port = 6667 }]
            "#,
        )
        .unwrap();
        class.dcc.proxy_outgoing = true;
        class.dcc.send_fast = send_fast;
        class.dcc.port_range = (40000, 40010);
        class
    }

    fn matrix() -> std::sync::Arc<crate::state::Matrix> {
        let config: crate::config::Config = toml::from_str(
            r#"
            [server]
            name = "dircproxy-ng"
            [listen]
            address = "127.0.0.1:57000"
            [[class]]
            name = "default"
            password = "x"
            servers = [{ host = "irc.example.net", port = 6667 }]
            "#,
        )
        .unwrap();
        crate::state::Matrix::new(config)
    }

    #[test]
    fn non_dcc_ctcp_is_unchanged() {
        let class = class_with_proxy(false);
        let matrix = matrix();
        let ctcp = CtcpOwned::version();
        assert!(matches!(
            rewrite_dcc_token(&ctcp, &class, &matrix, Some("203.0.113.7:6667".parse().unwrap())),
            DccOutcome::Unchanged
        ));
    }

    #[test]
    fn getsockname_failure_is_a_silent_skip_not_reject() {
        let class = class_with_proxy(false);
        let matrix = matrix();
        let ctcp = CtcpOwned {
            kind: CtcpKind::Dcc,
            params: Some("CHAT chat 3232235777 5000".to_string()),
        };
        assert!(matches!(rewrite_dcc_token(&ctcp, &class, &matrix, None), DccOutcome::SilentSkip));
    }

    #[test]
    fn chat_token_is_rewritten_with_host_order_address() {
        let class = class_with_proxy(false);
        let matrix = matrix();
        let ctcp = CtcpOwned {
            kind: CtcpKind::Dcc,
            params: Some("CHAT chat 3232235777 5000".to_string()),
        };
        let local: SocketAddr = "203.0.113.7:6667".parse().unwrap();
        match rewrite_dcc_token(&ctcp, &class, &matrix, Some(local)) {
            DccOutcome::Rewritten { ctcp, listen_port, remote, is_send } => {
                let params = ctcp.params.unwrap();
                assert!(params.starts_with("CHAT chat 3405803783 40000"));
                assert_eq!(listen_port, 40000);
                assert_eq!(remote, "192.168.1.1:5000".parse().unwrap());
                assert!(!is_send);
            }
            _ => panic!("expected rewrite"),
        }
    }

    #[test]
    fn port_exhaustion_rejects_when_class_asks_for_it() {
        let class = class_with_proxy(false);
        let matrix = matrix();
        // Exhaust the whole range.
        for port in class.dcc.port_range.0..=class.dcc.port_range.1 {
            matrix.allocate_dcc_port((port, port));
        }
        let ctcp = CtcpOwned {
            kind: CtcpKind::Dcc,
            params: Some("CHAT chat 3232235777 5000".to_string()),
        };
        let local: SocketAddr = "203.0.113.7:6667".parse().unwrap();
        assert!(matches!(
            rewrite_dcc_token(&ctcp, &class, &matrix, Some(local)),
            DccOutcome::Reject { .. }
        ));
    }

    #[test]
    fn tunnel_outgoing_overrides_remote_target() {
        let mut class = class_with_proxy(false);
        class.dcc.tunnel_outgoing = Some(9999);
        let matrix = matrix();
        let ctcp = CtcpOwned {
            kind: CtcpKind::Dcc,
            params: Some("SEND file.txt 3232235777 5000 1024".to_string()),
        };
        let local: SocketAddr = "203.0.113.7:6667".parse().unwrap();
        match rewrite_dcc_token(&ctcp, &class, &matrix, Some(local)) {
            DccOutcome::Rewritten { ctcp, remote, is_send, .. } => {
                let params = ctcp.params.unwrap();
                assert!(params.ends_with(" 1024"));
                assert!(params.starts_with("SEND file.txt 3405803783 40000"));
                assert_eq!(remote, "127.0.0.1:9999".parse().unwrap());
                assert!(is_send);
            }
            _ => panic!("expected rewrite"),
        }
    }
}
