//! Handler context: the state and channels every command handler touches.

use std::net::SocketAddr;
use std::sync::Arc;

use slirc_proto::{Message, Response};
use tokio::sync::mpsc;

use crate::contracts::SessionLog;
use crate::error::HandlerError;
use crate::state::{Matrix, ProxySession};
use crate::timer::TimerWheel;

/// Passed to every command handler. Borrows the live session out of the
/// reactor loop for the duration of one dispatch call.
pub struct Context<'a> {
    pub matrix: &'a Arc<Matrix>,
    pub session: &'a mut ProxySession,
    pub to_client: &'a mpsc::UnboundedSender<Message>,
    /// `None` until the server connection is `ACTIVE`.
    pub to_server: Option<&'a mpsc::UnboundedSender<Message>>,
    pub timers: &'a mut TimerWheel,
    /// `getsockname()` on the server-side socket, used by DCC rewriting.
    /// `None` means that call failed or there is no server connection yet.
    pub local_addr: Option<SocketAddr>,
    pub log: &'a dyn SessionLog,
}

impl Context<'_> {
    pub fn server_name(&self) -> &str {
        &self.matrix.config.server.name
    }

    pub fn nick(&self) -> &str {
        &self.session.nickname
    }

    /// Send a numeric reply to the client, prefixed with this proxy's server name.
    pub fn reply(&self, response: Response, params: Vec<String>) -> Result<(), HandlerError> {
        let message = Message {
            tags: None,
            prefix: Some(slirc_proto::Prefix::ServerName(self.server_name().to_string())),
            command: slirc_proto::Command::Response(response, params),
        };
        self.to_client.send(message)?;
        Ok(())
    }

    /// Send a `NOTICE` from the proxy itself to the client.
    pub fn notice(&self, text: impl Into<String>) -> Result<(), HandlerError> {
        let message = Message {
            tags: None,
            prefix: Some(slirc_proto::Prefix::ServerName(self.server_name().to_string())),
            command: slirc_proto::Command::NOTICE(self.nick().to_string(), text.into()),
        };
        self.to_client.send(message)?;
        Ok(())
    }

    /// Send a raw line directly to the client, unmodified.
    pub fn send_client(&self, message: Message) -> Result<(), HandlerError> {
        self.to_client.send(message)?;
        Ok(())
    }

    /// Forward a line verbatim to the server, if connected.
    pub fn forward(&self, message: Message) -> Result<(), HandlerError> {
        match self.to_server {
            Some(sender) => {
                sender.send(message)?;
                Ok(())
            }
            None => Err(HandlerError::ServerNotReady),
        }
    }
}
