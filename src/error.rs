//! Unified error handling for the proxy.
//!
//! `HandlerError` covers per-command dispatch failures and maps to the
//! client-visible numerics the command regimes use (§4.E, §6). `ProxyError`
//! is the crate-level error for reactor/DNS/DCC setup failures that are not
//! tied to a single command.

use slirc_proto::{Command, Message, Prefix, Response};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during command dispatch.
#[derive(Debug, Error)]
#[allow(clippy::large_enum_variant)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    /// Bad password or no matching class; client already got `ERROR` + 464.
    #[error("authentication failed")]
    AuthFailed,

    /// Server not yet ACTIVE (regime 4); client gets numeric 263.
    #[error("server not ready")]
    ServerNotReady,

    /// `/DIRCPROXY` subcommand not permitted by the class's feature gates.
    #[error("access denied")]
    AccessDenied,

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<Message>),

    #[error("client quit: {0:?}")]
    Quit(Option<String>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::NoNicknameGiven => "no_nickname_given",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::NotRegistered => "not_registered",
            Self::AlreadyRegistered => "already_registered",
            Self::AuthFailed => "auth_failed",
            Self::ServerNotReady => "server_not_ready",
            Self::AccessDenied => "access_denied",
            Self::Send(_) => "send_error",
            Self::Quit(_) => "quit",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to an IRC error reply message, if the error warrants one.
    ///
    /// Returns `None` for errors already reported via their own ERROR/close
    /// path (`AuthFailed`, `AccessDenied`) or with no client-visible form
    /// (`Send`, `Quit`, `Internal`).
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, cmd_name: &str) -> Option<Message> {
        let (response, args) = match self {
            Self::NotRegistered => (
                Response::ERR_NOTREGISTERED,
                vec!["*".to_string(), "You have not registered".to_string()],
            ),
            Self::NeedMoreParams => (
                Response::ERR_NEEDMOREPARAMS,
                vec![nick.to_string(), cmd_name.to_string(), "Not enough parameters".to_string()],
            ),
            Self::NoNicknameGiven => (
                Response::ERR_NONICKNAMEGIVEN,
                vec![nick.to_string(), "No nickname given".to_string()],
            ),
            Self::NicknameInUse(bad_nick) => (
                Response::ERR_NICKNAMEINUSE,
                vec![nick.to_string(), bad_nick.clone(), "Nickname is already in use".to_string()],
            ),
            Self::ErroneousNickname(bad_nick) => (
                Response::ERR_ERRONEOUSNICKNAME,
                vec![nick.to_string(), bad_nick.clone(), "Erroneous nickname".to_string()],
            ),
            Self::AlreadyRegistered => (
                Response::ERR_ALREADYREGISTERED,
                vec!["*".to_string(), "You may not reregister".to_string()],
            ),
            Self::ServerNotReady => (
                Response::RPL_TRYAGAIN,
                vec![
                    nick.to_string(),
                    cmd_name.to_string(),
                    "Please wait a while and try again.".to_string(),
                ],
            ),
            Self::AuthFailed | Self::AccessDenied | Self::Send(_) | Self::Quit(_) | Self::Internal(_) => {
                return None;
            }
        };
        Some(Message {
            tags: None,
            prefix: Some(Prefix::ServerName(server_name.to_string())),
            command: Command::Response(response, args),
        })
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Crate-level error for failures not tied to one command: DNS resolution,
/// DCC relay setup, server-session I/O.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("dns resolution failed for {host}: {source}")]
    Dns {
        host: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no free dcc listen port in configured range")]
    DccPortExhausted,

    #[error("dcc relay setup failed: {0}")]
    DccSetup(String),

    #[error("server-side local address unavailable (getsockname failed)")]
    NoLocalAddress,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_codes() {
        assert_eq!(HandlerError::NeedMoreParams.error_code(), "need_more_params");
        assert_eq!(HandlerError::NotRegistered.error_code(), "not_registered");
        assert_eq!(HandlerError::Internal("test".into()).error_code(), "internal_error");
    }

    #[test]
    fn need_more_params_has_a_reply() {
        let reply = HandlerError::NeedMoreParams.to_irc_reply("proxy", "alice", "USER");
        assert!(reply.is_some());
        assert!(matches!(
            reply.unwrap().command,
            Command::Response(Response::ERR_NEEDMOREPARAMS, _)
        ));
    }

    #[test]
    fn internal_and_auth_failed_have_no_reply() {
        assert!(HandlerError::Internal("oops".into())
            .to_irc_reply("proxy", "alice", "PASS")
            .is_none());
        assert!(HandlerError::AuthFailed.to_irc_reply("proxy", "alice", "PASS").is_none());
    }

    #[test]
    fn server_not_ready_maps_to_try_again() {
        let reply = HandlerError::ServerNotReady
            .to_irc_reply("proxy", "alice", "PRIVMSG")
            .unwrap();
        assert!(matches!(reply.command, Command::Response(Response::RPL_TRYAGAIN, _)));
    }
}
