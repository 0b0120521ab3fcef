// feed-client/src/realtime/machine.rs
use common::{generate_nonce, subscribe_topic, InboundFrame, OutboundFrame};
use std::time::Duration;

use super::transport::TransportError;

pub const STATUS_CONNECTED: &str = "WebSocket connected!";
pub const STATUS_DISCONNECTED: &str = "WebSocket disconnected!";
pub const STATUS_RECONNECTING: &str = "Reconnecting...";

/// Token and user id a connection authenticates with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

/// Discrete input to the connection lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(Credentials),
    Opened,
    Frame(String),
    TransportError(TransportError),
    Closed,
    ReconnectElapsed,
    PingTick,
    Stop,
}

/// Side effect the owner of the machine must carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a new socket, abandoning any current one
    Connect,
    Send(OutboundFrame),
    StartKeepAlive(Duration),
    CancelKeepAlive,
    ScheduleReconnect(Duration),
    CancelReconnect,
    Status(String),
    FeedEvent(String),
}

/// Lifecycle of the PubSub connection, free of I/O
///
/// Tracks which timers it has asked for so that at most one keep-alive and one
/// reconnect timer are ever requested at a time.
#[derive(Debug)]
pub struct ConnectionMachine {
    phase: Phase,
    credentials: Option<Credentials>,
    keep_alive_active: bool,
    reconnect_pending: bool,
    ping_interval: Duration,
    reconnect_delay: Duration,
}

impl ConnectionMachine {
    pub fn new(ping_interval: Duration, reconnect_delay: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            credentials: None,
            keep_alive_active: false,
            reconnect_pending: false,
            ping_interval,
            reconnect_delay,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn keep_alive_active(&self) -> bool {
        self.keep_alive_active
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let mut commands = Vec::new();

        match event {
            Event::Start(credentials) => {
                self.cancel_keep_alive(&mut commands);
                self.cancel_reconnect(&mut commands);
                self.credentials = Some(credentials);
                self.phase = Phase::Connecting;
                commands.push(Command::Connect);
            },
            Event::Opened => {
                if self.phase != Phase::Connecting {
                    tracing::debug!("Ignoring open event in phase {:?}", self.phase);
                    return commands;
                }
                let Some(credentials) = &self.credentials else {
                    return commands;
                };

                let topic = subscribe_topic(&credentials.user_id);
                tracing::info!("WebSocket open, listening on {}", topic);
                let listen = OutboundFrame::listen(topic, &credentials.token, generate_nonce());

                self.phase = Phase::Open;
                commands.push(Command::Status(STATUS_CONNECTED.to_string()));
                commands.push(Command::Send(listen));
                self.cancel_keep_alive(&mut commands);
                self.keep_alive_active = true;
                commands.push(Command::StartKeepAlive(self.ping_interval));
            },
            Event::Frame(text) => self.handle_frame(&text, &mut commands),
            Event::TransportError(e) => {
                tracing::error!("WebSocket Error: {}", e);
            },
            Event::Closed => match self.phase {
                Phase::Idle | Phase::Closed => {},
                Phase::Reconnecting => {
                    // Old socket went away; the scheduled reconnect still stands
                    commands.push(Command::Status(STATUS_DISCONNECTED.to_string()));
                },
                Phase::Connecting | Phase::Open => {
                    tracing::info!("WebSocket closed");
                    self.phase = Phase::Closed;
                    self.cancel_keep_alive(&mut commands);
                    commands.push(Command::Status(STATUS_DISCONNECTED.to_string()));
                },
            },
            Event::ReconnectElapsed => {
                if self.phase != Phase::Reconnecting || !self.reconnect_pending {
                    return commands;
                }
                tracing::info!("Reconnect delay elapsed, opening a new connection");
                self.reconnect_pending = false;
                self.phase = Phase::Connecting;
                commands.push(Command::Connect);
            },
            Event::PingTick => {
                if self.phase == Phase::Open {
                    commands.push(Command::Send(OutboundFrame::Ping));
                }
            },
            Event::Stop => {
                self.cancel_keep_alive(&mut commands);
                self.cancel_reconnect(&mut commands);
                self.credentials = None;
                self.phase = Phase::Idle;
            },
        }

        commands
    }

    fn handle_frame(&mut self, text: &str, commands: &mut Vec<Command>) {
        if matches!(self.phase, Phase::Idle | Phase::Closed) {
            tracing::debug!("Ignoring frame in phase {:?}", self.phase);
            return;
        }

        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("Ignoring frame: {}", e);
                return;
            }
        };

        match frame {
            InboundFrame::Reconnect => {
                if !matches!(self.phase, Phase::Open | Phase::Connecting) {
                    return;
                }
                tracing::info!("Server requested reconnect, retrying in {:?}", self.reconnect_delay);
                self.cancel_keep_alive(commands);
                self.cancel_reconnect(commands);
                self.phase = Phase::Reconnecting;
                commands.push(Command::Status(STATUS_RECONNECTING.to_string()));
                self.reconnect_pending = true;
                commands.push(Command::ScheduleReconnect(self.reconnect_delay));
            },
            InboundFrame::Message { data } => match data.payload() {
                Ok(payload) => {
                    tracing::info!("New message on topic {}: {}", data.topic, payload);
                    commands.push(Command::FeedEvent(format!("New event: {}", payload)));
                },
                Err(e) => tracing::debug!("Ignoring message: {}", e),
            },
            InboundFrame::Response { nonce, error } => match error.filter(|e| !e.is_empty()) {
                Some(error) => tracing::error!("Error listening to topic (nonce {:?}): {}", nonce, error),
                None => tracing::info!("Successfully listening to topic"),
            },
            InboundFrame::Pong => tracing::debug!("PONG received"),
            InboundFrame::Unknown => tracing::debug!("Ignoring unrecognized frame: {}", text),
        }
    }

    fn cancel_keep_alive(&mut self, commands: &mut Vec<Command>) {
        if self.keep_alive_active {
            self.keep_alive_active = false;
            commands.push(Command::CancelKeepAlive);
        }
    }

    fn cancel_reconnect(&mut self, commands: &mut Vec<Command>) {
        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(Command::CancelReconnect);
        }
    }
}
