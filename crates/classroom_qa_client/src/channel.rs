//! Realtime channel: WebSocket connection, session affiliation and
//! reconnect loop.
//!
//! The affiliated session is a single slot owned by the channel task. Every
//! domain event is checked against it before dispatch, and the join request
//! is re-sent after each reconnect.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::messages::{JoinSessionMessage, ServerMessage};
use crate::model::SessionId;

/// Events delivered to the consumer of the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Message(ServerMessage),
}

/// Transport state as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connected,
    Joined(SessionId),
}

/// Which session's room the channel belongs to, and whether the server has
/// been told yet.
#[derive(Debug, Clone, Default)]
pub struct Affiliation {
    connected: bool,
    session: Option<SessionId>,
    joined: bool,
}

impl Affiliation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ChannelState {
        match (&self.session, self.connected, self.joined) {
            (_, false, _) => ChannelState::Disconnected,
            (Some(id), true, true) => ChannelState::Joined(id.clone()),
            _ => ChannelState::Connected,
        }
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Transport came up. Returns the join request to (re-)issue, if any.
    pub fn on_connect(&mut self) -> Option<SessionId> {
        self.connected = true;
        self.joined = self.session.is_some();
        self.session.clone()
    }

    pub fn on_disconnect(&mut self) {
        self.connected = false;
        self.joined = false;
    }

    /// Affiliate with `session`. Returns the join request to send now, or
    /// `None` while disconnected (it is sent on the next connect).
    pub fn join(&mut self, session: SessionId) -> Option<SessionId> {
        self.session = Some(session.clone());
        self.joined = self.connected;
        self.connected.then_some(session)
    }

    pub fn leave(&mut self) {
        self.session = None;
        self.joined = false;
    }

    /// Whether a domain event may be dispatched to the consumer.
    pub fn admits(&self, message: &ServerMessage) -> bool {
        self.session.as_ref() == Some(message.session_id())
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Client connection error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One live WebSocket connection.
pub struct Connection {
    inner: WsStream,
}

/// Connect to the realtime endpoint at `url` (e.g. `ws://localhost:5000/realtime`).
pub async fn connect(url: &str) -> Result<Connection, ChannelError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    Ok(Connection { inner: ws_stream })
}

impl Connection {
    pub async fn join(&mut self, session_id: &SessionId) -> Result<(), ChannelError> {
        let json = serde_json::to_string(&JoinSessionMessage::new(session_id))?;
        self.inner.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Next domain message. `Ok(None)` once the server closes the
    /// connection. Frames that do not decode are logged and skipped.
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, ChannelError> {
        while let Some(item) = self.inner.next().await {
            let text = match item? {
                Message::Text(t) => t,
                Message::Close(_) => return Ok(None),
                _ => continue,
            };
            match ServerMessage::from_text(&text) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => debug!(error = %e, "skipping realtime frame"),
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Join(SessionId),
    Leave,
    Shutdown,
}

/// Handle used to steer the channel task.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ChannelHandle {
    /// Affiliate with a session's room. No leave of the previous room is
    /// sent; its events are filtered out instead.
    pub fn join(&self, session_id: SessionId) {
        let _ = self.commands.send(Command::Join(session_id));
    }

    /// Stop dispatching domain events.
    pub fn leave(&self) {
        let _ = self.commands.send(Command::Leave);
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Handle with no task behind it; the commands land on the receiver.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { commands }, rx)
    }
}

/// Start the channel task: connects to `url`, reconnects after
/// `reconnect_delay` whenever the transport drops, and forwards admitted
/// events on the returned receiver.
pub fn spawn(
    url: impl Into<String>,
    reconnect_delay: Duration,
) -> (
    ChannelHandle,
    mpsc::UnboundedReceiver<ChannelEvent>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(url.into(), reconnect_delay, command_rx, event_tx));
    (
        ChannelHandle {
            commands: command_tx,
        },
        event_rx,
        task,
    )
}

enum Flow {
    Reconnect,
    Stop,
}

async fn run(
    url: String,
    reconnect_delay: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let mut affiliation = Affiliation::new();
    loop {
        match connect(&url).await {
            Ok(mut conn) => {
                info!(%url, "realtime channel connected");
                let flow = serve(&mut conn, &mut affiliation, &mut commands, &events).await;
                affiliation.on_disconnect();
                if events.send(ChannelEvent::Disconnected).is_err() {
                    return;
                }
                if let Flow::Stop = flow {
                    return;
                }
                info!("realtime channel disconnected");
            }
            Err(e) => warn!(%url, error = %e, "realtime connect failed"),
        }

        let sleep = tokio::time::sleep(reconnect_delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                command = commands.recv() => match command {
                    Some(Command::Join(id)) => {
                        affiliation.join(id);
                    }
                    Some(Command::Leave) => affiliation.leave(),
                    Some(Command::Shutdown) | None => return,
                },
            }
        }
    }
}

async fn serve(
    conn: &mut Connection,
    affiliation: &mut Affiliation,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> Flow {
    if let Some(id) = affiliation.on_connect() {
        if let Err(e) = conn.join(&id).await {
            warn!(session = %id, error = %e, "re-join after connect failed");
            return Flow::Reconnect;
        }
        debug!(session = %id, "re-joined session room");
    }
    if events.send(ChannelEvent::Connected).is_err() {
        return Flow::Stop;
    }
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Join(id)) => {
                    if let Some(id) = affiliation.join(id) {
                        if let Err(e) = conn.join(&id).await {
                            warn!(session = %id, error = %e, "join failed");
                            return Flow::Reconnect;
                        }
                        debug!(session = %id, "joined session room");
                    }
                }
                Some(Command::Leave) => affiliation.leave(),
                Some(Command::Shutdown) | None => return Flow::Stop,
            },
            message = conn.next_message() => match message {
                Ok(Some(message)) => {
                    if !affiliation.admits(&message) {
                        debug!(
                            kind = message.kind(),
                            session = %message.session_id(),
                            "dropping event outside the affiliated session"
                        );
                        continue;
                    }
                    if events.send(ChannelEvent::Message(message)).is_err() {
                        return Flow::Stop;
                    }
                }
                Ok(None) => return Flow::Reconnect,
                Err(e) => {
                    warn!(error = %e, "realtime receive failed");
                    return Flow::Reconnect;
                }
            },
        }
    }
}
