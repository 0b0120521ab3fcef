// feed-client/tests/support/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use feed_client::identity::{IdentityError, IdentityResolver};
use feed_client::realtime::{Connection, Connector, TransportEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const PUBSUB_URL: &str = "wss://pubsub.test";

/// Test ends of one socket opened through [`FakeConnector`]
pub struct FakeSocket {
    pub url: String,
    pub sent: mpsc::UnboundedReceiver<String>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

impl FakeSocket {
    /// Frames written so far, decoded as JSON
    pub fn drain_sent(&mut self) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(text) = self.sent.try_recv() {
            frames.push(serde_json::from_str(&text).expect("client sent invalid JSON"));
        }
        frames
    }
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    pub sockets: Arc<Mutex<Vec<FakeSocket>>>,
}

impl FakeConnector {
    pub fn count(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub fn drain_sent(&self, index: usize) -> Vec<serde_json::Value> {
        self.sockets.lock().unwrap()[index].drain_sent()
    }

    /// True once the client has dropped its end of the socket's event channel
    pub fn is_abandoned(&self, index: usize) -> bool {
        self.sockets.lock().unwrap()[index].events.is_closed()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, url: &str) -> Connection {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        self.sockets.lock().unwrap().push(FakeSocket {
            url: url.to_string(),
            sent: out_rx,
            events: in_tx,
        });

        Connection {
            outbound: out_tx,
            inbound: in_rx,
        }
    }
}

/// Resolver answering with a fixed user id, or failing like an expired token
pub struct FakeResolver {
    pub user_id: Option<String>,
}

impl FakeResolver {
    pub fn returning(user_id: &str) -> Self {
        Self { user_id: Some(user_id.to_string()) }
    }

    pub fn failing() -> Self {
        Self { user_id: None }
    }
}

#[async_trait]
impl IdentityResolver for FakeResolver {
    async fn resolve_user_id(&self, _token: &str) -> Result<String, IdentityError> {
        self.user_id.clone().ok_or(IdentityError::NoUserRecord)
    }
}
