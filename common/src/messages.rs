// Common Crate - messages.rs
// common/src/messages.rs
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Topic prefix for channel subscription events
pub const SUBSCRIBE_EVENTS_TOPIC: &str = "channel-subscribe-events-v1";

/// The single PubSub topic a user's connection listens on
pub fn subscribe_topic(user_id: &str) -> String {
    format!("{}.{}", SUBSCRIBE_EVENTS_TOPIC, user_id)
}

/// Frame sent from the client to the PubSub server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum OutboundFrame {
    Ping,
    Listen { nonce: String, data: ListenData },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenData {
    pub topics: Vec<String>,
    pub auth_token: String,
}

impl OutboundFrame {
    /// LISTEN request for one topic
    pub fn listen(topic: String, auth_token: &str, nonce: String) -> Self {
        OutboundFrame::Listen {
            nonce,
            data: ListenData {
                topics: vec![topic],
                auth_token: auth_token.to_string(),
            },
        }
    }
}

/// Frame received from the PubSub server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum InboundFrame {
    Reconnect,
    Message {
        data: MessageData,
    },
    Response {
        #[serde(default)]
        nonce: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    Pong,
    #[serde(other)]
    Unknown,
}

/// Body of a MESSAGE frame. `message` is itself a JSON document encoded as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    pub topic: String,
    pub message: String,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedFrame)
    }
}

impl MessageData {
    /// Decode the embedded payload
    pub fn payload(&self) -> Result<serde_json::Value, ProtocolError> {
        serde_json::from_str(&self.message).map_err(|source| ProtocolError::MalformedPayload {
            topic: self.topic.clone(),
            source,
        })
    }
}
