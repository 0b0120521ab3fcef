// feed-client/src/realtime/transport.rs
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("failed to send: {0}")]
    Send(String),

    #[error("failed to receive: {0}")]
    Receive(String),
}

/// What a socket reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    Error(TransportError),
    Closed,
}

/// Handle to one socket: text frames go out on `outbound`, events arrive on `inbound`.
/// Dropping `inbound` abandons the socket: it is closed without a close frame.
pub struct Connection {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens sockets. Must be called from within a running runtime.
pub trait Connector {
    fn connect(&self, url: &str) -> Connection;
}

/// Real WebSocket transport
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> Connection {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<TransportEvent>();
        let url = url.to_string();

        tokio::spawn(async move {
            match connect_async(url.as_str()).await {
                Ok((ws_stream, _)) => {
                    let _ = in_tx.send(TransportEvent::Opened);
                    let (mut ws_sink, mut ws_stream) = ws_stream.split();

                    // Forward frames from the client to the server
                    let writer_events = in_tx.clone();
                    let writer = tokio::spawn(async move {
                        while let Some(text) = out_rx.recv().await {
                            if let Err(e) = ws_sink.send(WsMessage::Text(text)).await {
                                let _ = writer_events.send(TransportEvent::Error(TransportError::Send(e.to_string())));
                                break;
                            }
                        }
                    });

                    // Forward frames from the server to the client until either side goes away
                    loop {
                        let msg = tokio::select! {
                            _ = in_tx.closed() => {
                                tracing::debug!("Socket abandoned, dropping connection to {}", url);
                                break;
                            },
                            msg = ws_stream.next() => match msg {
                                Some(msg) => msg,
                                None => break,
                            },
                        };

                        match msg {
                            Ok(WsMessage::Text(text)) => {
                                if in_tx.send(TransportEvent::Text(text)).is_err() {
                                    break;
                                }
                            },
                            Ok(WsMessage::Close(frame)) => {
                                tracing::debug!("Server closed the socket: {:?}", frame);
                                break;
                            },
                            Ok(_) => {
                                // Control and binary frames carry nothing for us
                            },
                            Err(e) => {
                                let _ = in_tx.send(TransportEvent::Error(TransportError::Receive(e.to_string())));
                                break;
                            }
                        }
                    }

                    writer.abort();
                    let _ = in_tx.send(TransportEvent::Closed);
                },
                Err(e) => {
                    let _ = in_tx.send(TransportEvent::Error(TransportError::Connect(e.to_string())));
                    let _ = in_tx.send(TransportEvent::Closed);
                }
            }
        });

        Connection {
            outbound: out_tx,
            inbound: in_rx,
        }
    }
}
