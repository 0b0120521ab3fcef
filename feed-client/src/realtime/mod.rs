// feed-client/src/realtime/mod.rs
pub mod client;
pub mod machine;
pub mod transport;

pub use client::{ClientStatus, GetClientStatus, Inbound, RealtimeClient, Start, Stop};
pub use machine::{Command, ConnectionMachine, Credentials, Event, Phase};
pub use transport::{Connection, Connector, TransportError, TransportEvent, TungsteniteConnector};
