// feed-client/src/realtime/client.rs
use actix::fut::wrap_future;
use actix::{Actor, AsyncContext, Context, Handler, Message, MessageResult, Recipient, SpawnHandle};
use common::Config;
use std::time::Duration;
use tokio::sync::mpsc;

use super::machine::{Command, ConnectionMachine, Credentials, Event, Phase};
use super::transport::{Connector, TransportEvent};
use crate::view::ViewUpdate;

/// Begin (or restart) the connection for a user
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Start {
    pub credentials: Credentials,
}

/// Cancel both timers and abandon the current socket
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Stop;

/// Transport event tagged with the connection attempt it belongs to
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Inbound {
    pub generation: u64,
    pub event: TransportEvent,
}

#[derive(Message)]
#[rtype(result = "ClientStatus")]
pub struct GetClientStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStatus {
    pub phase: Phase,
    pub generation: u64,
    pub keep_alive_active: bool,
    pub reconnect_pending: bool,
}

/// Actor owning the PubSub socket plus its keep-alive and reconnect timers
pub struct RealtimeClient {
    machine: ConnectionMachine,
    connector: Box<dyn Connector>,
    url: String,
    view: Recipient<ViewUpdate>,
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    forwarder: Option<SpawnHandle>,
    keep_alive: Option<SpawnHandle>,
    reconnect: Option<SpawnHandle>,
}

impl RealtimeClient {
    pub fn new(
        url: impl Into<String>,
        ping_interval: Duration,
        reconnect_delay: Duration,
        connector: Box<dyn Connector>,
        view: Recipient<ViewUpdate>,
    ) -> Self {
        Self {
            machine: ConnectionMachine::new(ping_interval, reconnect_delay),
            connector,
            url: url.into(),
            view,
            generation: 0,
            outbound: None,
            forwarder: None,
            keep_alive: None,
            reconnect: None,
        }
    }

    pub fn from_config(config: &Config, connector: Box<dyn Connector>, view: Recipient<ViewUpdate>) -> Self {
        Self::new(
            config.twitch.pubsub_url.clone(),
            config.timing.ping_interval(),
            config.timing.reconnect_delay(),
            connector,
            view,
        )
    }

    fn dispatch(&mut self, event: Event, ctx: &mut Context<Self>) {
        for command in self.machine.handle(event) {
            self.execute(command, ctx);
        }
    }

    fn execute(&mut self, command: Command, ctx: &mut Context<Self>) {
        match command {
            Command::Connect => self.connect(ctx),
            Command::Send(frame) => {
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to serialize frame: {}", e);
                        return;
                    }
                };
                match &self.outbound {
                    Some(tx) => {
                        if tx.send(text).is_err() {
                            tracing::warn!("Socket writer is gone, dropping frame");
                        }
                    },
                    None => tracing::warn!("No WebSocket connection to send on"),
                }
            },
            Command::StartKeepAlive(every) => {
                self.cancel_keep_alive(ctx);
                let handle = ctx.run_interval(every, |act, ctx| {
                    act.dispatch(Event::PingTick, ctx);
                });
                self.keep_alive = Some(handle);
            },
            Command::CancelKeepAlive => self.cancel_keep_alive(ctx),
            Command::ScheduleReconnect(delay) => {
                self.cancel_reconnect(ctx);
                let handle = ctx.run_later(delay, |act, ctx| {
                    act.reconnect = None;
                    act.dispatch(Event::ReconnectElapsed, ctx);
                });
                self.reconnect = Some(handle);
            },
            Command::CancelReconnect => self.cancel_reconnect(ctx),
            Command::Status(text) => self.view.do_send(ViewUpdate::Status(text)),
            Command::FeedEvent(text) => self.view.do_send(ViewUpdate::Event(text)),
        }
    }

    // Open a fresh socket; events from earlier generations are dropped
    fn connect(&mut self, ctx: &mut Context<Self>) {
        self.abandon_socket(ctx);
        self.generation += 1;
        let generation = self.generation;
        tracing::info!("Connecting to {} (attempt {})", self.url, generation);

        let connection = self.connector.connect(&self.url);
        self.outbound = Some(connection.outbound);

        let addr = ctx.address();
        let mut inbound = connection.inbound;
        let handle = ctx.spawn(wrap_future::<_, Self>(async move {
            while let Some(event) = inbound.recv().await {
                addr.do_send(Inbound { generation, event });
            }
        }));
        self.forwarder = Some(handle);
    }

    // Drop both ends of the current socket so its transport task shuts down
    fn abandon_socket(&mut self, ctx: &mut Context<Self>) {
        self.outbound = None;
        if let Some(handle) = self.forwarder.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_keep_alive(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.keep_alive.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_reconnect(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.reconnect.take() {
            ctx.cancel_future(handle);
        }
    }
}

impl Actor for RealtimeClient {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Realtime client started for {}", self.url);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Realtime client stopped");
    }
}

impl Handler<Start> for RealtimeClient {
    type Result = ();

    fn handle(&mut self, msg: Start, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Starting realtime connection for user {}", msg.credentials.user_id);
        self.dispatch(Event::Start(msg.credentials), ctx);
    }
}

impl Handler<Stop> for RealtimeClient {
    type Result = ();

    fn handle(&mut self, _msg: Stop, ctx: &mut Self::Context) -> Self::Result {
        self.dispatch(Event::Stop, ctx);

        // No close frame is sent; anything the old socket already reported is stale
        self.abandon_socket(ctx);
        self.generation += 1;
    }
}

impl Handler<Inbound> for RealtimeClient {
    type Result = ();

    fn handle(&mut self, msg: Inbound, ctx: &mut Self::Context) -> Self::Result {
        if msg.generation != self.generation {
            tracing::debug!("Dropping event from stale connection {}: {:?}", msg.generation, msg.event);
            return;
        }

        let event = match msg.event {
            TransportEvent::Opened => Event::Opened,
            TransportEvent::Text(text) => {
                tracing::debug!("Message from server: {}", text);
                Event::Frame(text)
            },
            TransportEvent::Error(e) => Event::TransportError(e),
            TransportEvent::Closed => Event::Closed,
        };
        self.dispatch(event, ctx);
    }
}

impl Handler<GetClientStatus> for RealtimeClient {
    type Result = MessageResult<GetClientStatus>;

    fn handle(&mut self, _msg: GetClientStatus, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(ClientStatus {
            phase: self.machine.phase(),
            generation: self.generation,
            keep_alive_active: self.keep_alive.is_some(),
            reconnect_pending: self.reconnect.is_some(),
        })
    }
}
