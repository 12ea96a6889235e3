//! The per-session cooperative reactor (§4.A, adapted to one `tokio::task`
//! per session running `tokio::select!` over the client socket, the server
//! socket, the timer wheel, and this session's outbound queues — rather
//! than the upstream's single-threaded OS-level `select()` over every
//! session at once. Recorded in `SPEC_FULL.md`'s resolved open questions.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slirc_proto::transport::Transport;
use slirc_proto::{Command, Message, Prefix};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::config::ServerEntry;
use crate::contracts::TracingLog;
use crate::dns::Resolver;
use crate::handlers::core::Context;
use crate::handlers::dispatch;
use crate::state::{AttachHandoff, ClientStatus, Matrix, ProxySession, ServerStatus, SessionHandle};
use crate::timer::TimerWheel;

const CLIENT_AUTH_TIMER: &str = "client_auth";
const CLIENT_CONNECT_TIMER: &str = "client_connect";

pub struct SessionTask {
    matrix: Arc<Matrix>,
    session: ProxySession,
    /// `None` while detached (§3): the task keeps pumping `server`/timers
    /// with no client to write to until a reattach hands one back in.
    client: Option<Transport>,
    server: Option<Transport>,
    to_client_tx: mpsc::UnboundedSender<Message>,
    to_client_rx: mpsc::UnboundedReceiver<Message>,
    to_server_tx: mpsc::UnboundedSender<Message>,
    to_server_rx: mpsc::UnboundedReceiver<Message>,
    timers: TimerWheel,
    local_addr: Option<SocketAddr>,
    log: TracingLog,
    resolver: Resolver,
    /// Shared with this task's `Matrix` registration, so `PassHandler` can
    /// read it from another task without a round trip.
    connected: Arc<AtomicBool>,
    attach_tx: mpsc::Sender<AttachHandoff>,
    attach_rx: mpsc::Receiver<AttachHandoff>,
    registered_class: Option<String>,
}

impl SessionTask {
    pub async fn spawn(stream: TcpStream, peer_addr: SocketAddr, matrix: Arc<Matrix>, resolver: Resolver) {
        tokio::spawn(async move {
            match Self::new(stream, peer_addr, matrix, resolver).await {
                Ok(task) => task.run().await,
                Err(error) => tracing::warn!(%peer_addr, %error, "failed to start session"),
            }
        });
    }

    async fn new(stream: TcpStream, peer_addr: SocketAddr, matrix: Arc<Matrix>, resolver: Resolver) -> anyhow::Result<Self> {
        matrix.metrics.sessions_created.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let hostname = resolver
            .host_from_addr(peer_addr.ip())
            .await
            .unwrap_or_else(|_| peer_addr.ip().to_string());

        let client = Transport::tcp(stream)?;
        let session = ProxySession::new(hostname);

        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();
        let (to_server_tx, to_server_rx) = mpsc::unbounded_channel();
        let (attach_tx, attach_rx) = mpsc::channel(1);
        let mut timers = TimerWheel::new();
        timers.new_timer(CLIENT_AUTH_TIMER, Duration::from_secs(60));

        Ok(Self {
            matrix,
            session,
            client: Some(client),
            server: None,
            to_client_tx,
            to_client_rx,
            to_server_tx,
            to_server_rx,
            timers,
            local_addr: None,
            log: TracingLog,
            resolver,
            connected: Arc::new(AtomicBool::new(true)),
            attach_tx,
            attach_rx,
            registered_class: None,
        })
    }

    async fn run(mut self) {
        let mut shutdown = self.matrix.shutdown.subscribe();

        loop {
            let deadline = self.timers.next_deadline();
            let sleep = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    self.close_client_and_server().await;
                    return;
                }

                Some(handoff) = self.attach_rx.recv() => {
                    self.handle_attach(handoff).await;
                }

                result = read_client(&mut self.client), if self.client.is_some() => {
                    match result {
                        Some(Ok(Some(message))) => {
                            if !self.handle_client_message(message).await {
                                self.close_client_and_server().await;
                                return;
                            }
                        }
                        Some(Ok(None)) | Some(Err(_)) | None => {
                            if !self.on_client_disconnected().await {
                                return;
                            }
                        }
                    }
                }

                result = read_server(&mut self.server), if self.server.is_some() => {
                    match result {
                        Some(Ok(Some(message))) => self.handle_server_message(message).await,
                        Some(Ok(None)) | Some(Err(_)) | None => {
                            self.server = None;
                            self.session.server_status = crate::state::ServerStatus::empty();
                        }
                    }
                }

                Some(message) = self.to_client_rx.recv() => {
                    if let Some(client) = self.client.as_mut() {
                        if client.write_message(&message).await.is_err() {
                            self.close_client_and_server().await;
                            return;
                        }
                    }
                }

                Some(message) = self.to_server_rx.recv(), if self.server.is_some() => {
                    if let Some(server) = self.server.as_mut() {
                        let _ = server.write_message(&message).await;
                    }
                }

                () = sleep, if deadline.is_some() => {
                    self.handle_expired_timers().await;
                }
            }

            if self.session.reconnect_requested {
                self.session.reconnect_requested = false;
                self.reconnect().await;
            }
        }
    }

    async fn handle_client_message(&mut self, message: Message) -> bool {
        let to_server = self.server.is_some().then_some(&self.to_server_tx);
        let mut ctx = Context {
            matrix: &self.matrix,
            session: &mut self.session,
            to_client: &self.to_client_tx,
            to_server,
            timers: &mut self.timers,
            local_addr: self.local_addr,
            log: &self.log,
        };

        match dispatch(&mut ctx, &message).await {
            Ok(()) => {
                if let Some(class_name) = self.session.attach_to.take() {
                    self.perform_attach(class_name).await;
                    return false;
                }
                if self.session.is_authed() {
                    self.timers.del(CLIENT_AUTH_TIMER);
                    self.register_with_class();
                }
                if self.session.is_fully_registered() && self.server.is_none() {
                    self.maybe_autoconnect().await;
                }
                true
            }
            Err(error) => {
                if let Some(reply) = error.to_irc_reply(&self.matrix.config.server.name, &self.session.nickname, message.command.name()) {
                    if let Some(client) = self.client.as_mut() {
                        let _ = client.write_message(&reply).await;
                    }
                }
                !matches!(error, crate::error::HandlerError::Quit(_) | crate::error::HandlerError::AuthFailed)
            }
        }
    }

    /// Registers this task's handle as the live occupant of its bound
    /// class, the first time `AUTHED` is observed (§4.D). A no-op on
    /// repeat dispatches once already registered.
    fn register_with_class(&mut self) {
        if self.registered_class.is_some() {
            return;
        }
        let Some(class) = self.session.class() else { return };
        let name = class.name.clone();
        self.matrix.register_session(
            name.clone(),
            SessionHandle { connected: self.connected.clone(), attach: self.attach_tx.clone() },
        );
        self.registered_class = Some(name);
    }

    fn unregister_from_class(&mut self) {
        if let Some(name) = self.registered_class.take() {
            self.matrix.unregister_session(&name, &self.connected);
        }
    }

    /// Hands this task's client socket to whatever session is already bound
    /// to `class_name`, live or detached (§4.E Authentication, reattach).
    /// This task's own session never becomes the occupant — its caller
    /// returns `false` right after this to tear itself down.
    async fn perform_attach(&mut self, class_name: String) {
        let Some(client) = self.client.take() else { return };
        let hostname = self.session.hostname.clone();
        let requested_nick = (!self.session.nickname.is_empty()).then(|| self.session.nickname.clone());
        let handoff = AttachHandoff { client, hostname, requested_nick };

        let attach = self.matrix.fetch_class(&class_name).map(|existing| existing.attach.clone());
        match attach {
            Some(attach) if attach.send(handoff).await.is_ok() => {}
            _ => tracing::warn!(class = %class_name, "reattach target vanished before handoff"),
        }
    }

    /// Transplants a new client socket in, evicting whatever client this
    /// session currently holds first (§4.E Authentication, reattach).
    async fn handle_attach(&mut self, handoff: AttachHandoff) {
        if let Some(mut old_client) = self.client.take() {
            let _ = old_client.write_message(&error_message(&self.matrix.config.server.name, "Collided with new user")).await;
        }

        self.client = Some(handoff.client);
        self.connected.store(true, Ordering::Release);
        self.session.hostname = handoff.hostname.clone();
        self.session.visible_hostname = handoff.hostname;
        self.session.client_status.insert(ClientStatus::CONNECTED | ClientStatus::AUTHED);
        self.matrix.metrics.sessions_attached.fetch_add(1, Ordering::Relaxed);

        if !self.session.server_active() {
            return;
        }

        if let Some(nick) = handoff.requested_nick {
            if nick != self.session.nickname {
                let _ = self.to_server_tx.send(raw(Command::NICK(nick.clone())));
                self.session.nickname = nick;
            }
        }

        let clear_away = self.session.away_message.is_none() && self.session.class().is_some_and(|c| c.away_message.is_some());
        if clear_away {
            let _ = self.to_server_tx.send(raw(Command::AWAY(None)));
        }

        let unjoined: Vec<(String, Option<String>)> =
            self.session.channels.iter().filter(|c| c.unjoined).map(|c| (c.name.clone(), c.key.clone())).collect();
        for (name, key) in unjoined {
            let _ = self.to_server_tx.send(raw(Command::JOIN(name.clone(), key, None)));
            if let Some(channel) = self.session.find_channel_mut(&name) {
                channel.mark_active();
            }
        }

        if let Some(attach_message) = self.session.class().and_then(|c| c.attach_message.clone()) {
            let text = match attach_message.strip_prefix("/me ") {
                Some(rest) => format!("\u{1}ACTION {rest}\u{1}"),
                None => attach_message,
            };
            let targets: Vec<String> = self.session.channels.iter().filter(|c| !c.inactive).map(|c| c.name.clone()).collect();
            for target in targets {
                let _ = self.to_server_tx.send(raw(Command::PRIVMSG(target, text.clone())));
            }
        }
    }

    async fn handle_server_message(&mut self, message: Message) {
        if let Command::Response(slirc_proto::Response::RPL_WELCOME, _) = &message.command {
            if !self.session.server_status.contains(ServerStatus::ACTIVE) {
                self.session.server_status.insert(ServerStatus::ACTIVE);
                self.timers.del(CLIENT_CONNECT_TIMER);
            }
            return;
        }
        if let Some(client) = self.client.as_mut() {
            let _ = client.write_message(&message).await;
        }
    }

    async fn handle_expired_timers(&mut self) {
        for name in self.timers.take_expired() {
            let reason = match name {
                CLIENT_AUTH_TIMER if !self.session.is_authed() => Some("Login Timeout"),
                CLIENT_CONNECT_TIMER if self.server.is_none() => Some("Connect Timeout"),
                _ => None,
            };
            if let Some(reason) = reason {
                if let Some(client) = self.client.as_mut() {
                    let _ = client.write_message(&Message { tags: None, prefix: None, command: Command::ERROR(reason.to_string()) }).await;
                }
                self.close_client_and_server().await;
            }
        }
    }

    async fn maybe_autoconnect(&mut self) {
        let Some(class) = self.session.class().cloned() else { return };
        if class.server_autoconnect {
            self.connect_to_next_server(&class).await;
        } else {
            let _ = self
                .to_client_tx
                .send(notice(&self.matrix.config.server.name, &self.session.nickname, "Use /DIRCPROXY JUMP <n> to pick a server."));
            self.timers.new_timer(CLIENT_CONNECT_TIMER, Duration::from_secs(class.connect_timeout));
        }
    }

    async fn reconnect(&mut self) {
        self.server = None;
        if let Some(class) = self.session.class().cloned() {
            self.connect_to_next_server(&class).await;
        }
    }

    async fn connect_to_next_server(&mut self, class: &crate::config::ClassConfig) {
        let Some(entry) = class.servers.get(self.session.next_server) else { return };
        match self.dial(entry).await {
            Ok((server, local_addr)) => {
                self.server = Some(server);
                self.local_addr = Some(local_addr);
                self.session.server_status.insert(ServerStatus::CONNECTED);
            }
            Err(error) => {
                tracing::warn!(host = %entry.host, %error, "server connect failed");
            }
        }
    }

    async fn dial(&self, entry: &ServerEntry) -> anyhow::Result<(Transport, SocketAddr)> {
        let ip = self.resolver.addr_from_host(&entry.host).await?;
        let stream = TcpStream::connect((ip, entry.port)).await?;
        let local_addr = stream.local_addr()?;
        let mut server = Transport::tcp(stream)?;
        if let Some(password) = &entry.password {
            server.write_message(&Message { tags: None, prefix: None, command: Command::PASS(password.clone()) }).await?;
        }
        server
            .write_message(&Message { tags: None, prefix: None, command: Command::NICK(self.session.nickname.clone()) })
            .await?;
        let username = self.session.username.clone().unwrap_or_else(|| self.session.nickname.clone());
        let realname = self.session.realname.clone().unwrap_or_else(|| self.session.nickname.clone());
        server
            .write_message(&Message { tags: None, prefix: None, command: Command::USER(username, "0".to_string(), realname) })
            .await?;
        Ok((server, local_addr))
    }

    /// Runs Detach and keeps this task alive so the server connection
    /// survives past client disconnect (§1, §3), unless `die_on_close` is
    /// set or there's no server worth detaching to. Returns whether the
    /// caller should keep looping.
    async fn on_client_disconnected(&mut self) -> bool {
        if self.session.die_on_close || !self.session.server_active() {
            self.close_client_and_server().await;
            return false;
        }
        self.client = None;
        self.connected.store(false, Ordering::Release);

        let to_server = self.server.is_some().then_some(&self.to_server_tx);
        let mut ctx = Context {
            matrix: &self.matrix,
            session: &mut self.session,
            to_client: &self.to_client_tx,
            to_server,
            timers: &mut self.timers,
            local_addr: self.local_addr,
            log: &self.log,
        };
        let _ = crate::detach::run_detach(&mut ctx, None);
        self.matrix.metrics.sessions_detached.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.timers.delall();
        true
    }

    async fn close_client_and_server(&mut self) {
        if let Some(server) = self.server.as_mut() {
            let _ = server
                .write_message(&Message { tags: None, prefix: None, command: Command::QUIT(Some("Client Quit".to_string())) })
                .await;
        }
        self.timers.delall();
        self.unregister_from_class();
    }
}

async fn read_client(client: &mut Option<Transport>) -> Option<Result<Option<Message>, slirc_proto::transport::TransportReadError>> {
    match client {
        Some(transport) => Some(transport.read_message().await),
        None => None,
    }
}

async fn read_server(server: &mut Option<Transport>) -> Option<Result<Option<Message>, slirc_proto::transport::TransportReadError>> {
    match server {
        Some(transport) => Some(transport.read_message().await),
        None => None,
    }
}

fn notice(server_name: &str, nick: &str, text: &str) -> Message {
    Message {
        tags: None,
        prefix: Some(Prefix::ServerName(server_name.to_string())),
        command: Command::NOTICE(nick.to_string(), text.to_string()),
    }
}

fn raw(command: Command) -> Message {
    Message { tags: None, prefix: None, command }
}

fn error_message(server_name: &str, text: &str) -> Message {
    Message {
        tags: None,
        prefix: Some(Prefix::ServerName(server_name.to_string())),
        command: Command::ERROR(text.to_string()),
    }
}
