// feed-client/tests/realtime_client_test.rs
mod support;

use actix::{Actor, Addr};
use feed_client::realtime::{
    Credentials, GetClientStatus, Inbound, Phase, RealtimeClient, Start, Stop, TransportError, TransportEvent,
};
use feed_client::view::{GetViewState, ViewActor};
use serde_json::json;
use std::time::Duration;
use support::{FakeConnector, PUBSUB_URL};

fn credentials() -> Credentials {
    Credentials {
        token: "tok".to_string(),
        user_id: "42".to_string(),
    }
}

fn spawn_client(ping: Duration, reconnect: Duration) -> (Addr<RealtimeClient>, Addr<ViewActor>, FakeConnector) {
    let connector = FakeConnector::default();
    let view = ViewActor::new(Duration::from_secs(3)).start();
    let client = RealtimeClient::new(
        PUBSUB_URL,
        ping,
        reconnect,
        Box::new(connector.clone()),
        view.clone().recipient(),
    )
    .start();
    (client, view, connector)
}

async fn open(client: &Addr<RealtimeClient>) {
    client.send(Start { credentials: credentials() }).await.unwrap();
    let generation = client.send(GetClientStatus).await.unwrap().generation;
    client
        .send(Inbound { generation, event: TransportEvent::Opened })
        .await
        .unwrap();
}

async fn text(client: &Addr<RealtimeClient>, frame: serde_json::Value) {
    let generation = client.send(GetClientStatus).await.unwrap().generation;
    client
        .send(Inbound { generation, event: TransportEvent::Text(frame.to_string()) })
        .await
        .unwrap();
}

#[actix::test]
async fn test_open_sends_listen_and_starts_keep_alive() {
    let (client, view, connector) = spawn_client(Duration::from_secs(300), Duration::from_secs(120));

    client.send(Start { credentials: credentials() }).await.unwrap();
    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(status.phase, Phase::Connecting);
    assert_eq!(status.generation, 1);
    assert_eq!(connector.count(), 1);
    assert_eq!(connector.sockets.lock().unwrap()[0].url, PUBSUB_URL);

    client
        .send(Inbound { generation: 1, event: TransportEvent::Opened })
        .await
        .unwrap();

    let sent = connector.drain_sent(0);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["type"], "LISTEN");
    assert_eq!(sent[0]["data"]["topics"], json!(["channel-subscribe-events-v1.42"]));
    assert_eq!(sent[0]["data"]["auth_token"], "tok");
    assert!(sent[0]["nonce"].as_str().map(|n| !n.is_empty()).unwrap_or(false));

    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(status.phase, Phase::Open);
    assert!(status.keep_alive_active);
    assert!(!status.reconnect_pending);

    let page = view.send(GetViewState).await.unwrap();
    assert_eq!(page.status, "WebSocket connected!");
}

#[actix::test]
async fn test_keep_alive_pings() {
    let (client, _view, connector) = spawn_client(Duration::from_millis(20), Duration::from_secs(120));
    open(&client).await;

    actix::clock::sleep(Duration::from_millis(150)).await;

    let sent = connector.drain_sent(0);
    assert_eq!(sent[0]["type"], "LISTEN");
    let pings = sent.iter().filter(|frame| **frame == json!({ "type": "PING" })).count();
    assert!(pings >= 1, "expected at least one PING, got {:?}", sent);
}

#[actix::test]
async fn test_message_frame_prepends_feed_entry() {
    let (client, view, _connector) = spawn_client(Duration::from_secs(300), Duration::from_secs(120));
    open(&client).await;

    text(&client, json!({ "type": "MESSAGE", "data": { "topic": "t", "message": "{\"x\":1}" } })).await;
    text(&client, json!({ "type": "MESSAGE", "data": { "topic": "t", "message": "{\"x\":2}" } })).await;

    let page = view.send(GetViewState).await.unwrap();
    assert_eq!(page.events.len(), 2);
    assert_eq!(page.events[0], r#"New event: {"x":2}"#);
    assert_eq!(page.events[1], r#"New event: {"x":1}"#);
}

#[actix::test]
async fn test_responses_and_errors_leave_feed_alone() {
    let (client, view, _connector) = spawn_client(Duration::from_secs(300), Duration::from_secs(120));
    open(&client).await;

    text(&client, json!({ "type": "RESPONSE", "nonce": "n", "error": "ERR_BADAUTH" })).await;
    text(&client, json!({ "type": "RESPONSE", "nonce": "n", "error": "" })).await;
    let generation = client.send(GetClientStatus).await.unwrap().generation;
    client
        .send(Inbound {
            generation,
            event: TransportEvent::Error(TransportError::Receive("reset".into())),
        })
        .await
        .unwrap();

    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(status.phase, Phase::Open);
    assert!(status.keep_alive_active);

    let page = view.send(GetViewState).await.unwrap();
    assert!(page.events.is_empty());
    assert_eq!(page.status, "WebSocket connected!");
}

#[actix::test]
async fn test_reconnect_request_opens_one_new_connection() {
    let (client, view, connector) = spawn_client(Duration::from_secs(300), Duration::from_millis(30));
    open(&client).await;

    text(&client, json!({ "type": "RECONNECT" })).await;

    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(status.phase, Phase::Reconnecting);
    assert!(!status.keep_alive_active);
    assert!(status.reconnect_pending);
    assert_eq!(view.send(GetViewState).await.unwrap().status, "Reconnecting...");

    actix::clock::sleep(Duration::from_millis(200)).await;

    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(connector.count(), 2);
    assert_eq!(status.generation, 2);
    assert_eq!(status.phase, Phase::Connecting);
    assert!(!status.reconnect_pending);

    // The abandoned socket closing late does not disturb the new one
    client
        .send(Inbound { generation: 1, event: TransportEvent::Closed })
        .await
        .unwrap();
    client
        .send(Inbound { generation: 2, event: TransportEvent::Opened })
        .await
        .unwrap();

    let sent = connector.drain_sent(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["data"]["topics"], json!(["channel-subscribe-events-v1.42"]));
    assert_eq!(client.send(GetClientStatus).await.unwrap().phase, Phase::Open);
}

#[actix::test]
async fn test_reconnect_releases_previous_socket() {
    let (client, _view, connector) = spawn_client(Duration::from_secs(300), Duration::from_millis(30));
    open(&client).await;
    assert!(!connector.is_abandoned(0));

    text(&client, json!({ "type": "RECONNECT" })).await;
    actix::clock::sleep(Duration::from_millis(200)).await;
    client.send(GetClientStatus).await.unwrap();

    assert_eq!(connector.count(), 2);
    assert!(connector.is_abandoned(0));
    assert!(!connector.is_abandoned(1));
}

#[actix::test]
async fn test_close_does_not_reconnect() {
    let (client, view, connector) = spawn_client(Duration::from_secs(300), Duration::from_millis(30));
    open(&client).await;

    client
        .send(Inbound { generation: 1, event: TransportEvent::Closed })
        .await
        .unwrap();

    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(status.phase, Phase::Closed);
    assert!(!status.keep_alive_active);
    assert!(!status.reconnect_pending);
    assert_eq!(view.send(GetViewState).await.unwrap().status, "WebSocket disconnected!");

    actix::clock::sleep(Duration::from_millis(100)).await;
    assert_eq!(connector.count(), 1);
}

#[actix::test]
async fn test_stop_cancels_timers() {
    let (client, _view, connector) = spawn_client(Duration::from_secs(300), Duration::from_millis(50));
    open(&client).await;
    text(&client, json!({ "type": "RECONNECT" })).await;

    client.send(Stop).await.unwrap();

    let status = client.send(GetClientStatus).await.unwrap();
    assert_eq!(status.phase, Phase::Idle);
    assert!(!status.keep_alive_active);
    assert!(!status.reconnect_pending);

    actix::clock::sleep(Duration::from_millis(150)).await;
    assert_eq!(connector.count(), 1);

    // Events from the abandoned socket are ignored
    client
        .send(Inbound { generation: 1, event: TransportEvent::Opened })
        .await
        .unwrap();
    assert_eq!(client.send(GetClientStatus).await.unwrap().phase, Phase::Idle);
}

#[actix::test]
async fn test_stop_releases_socket() {
    let (client, _view, connector) = spawn_client(Duration::from_secs(300), Duration::from_secs(120));
    open(&client).await;

    client.send(Stop).await.unwrap();
    actix::clock::sleep(Duration::from_millis(20)).await;
    client.send(GetClientStatus).await.unwrap();

    assert!(connector.is_abandoned(0));
    assert_eq!(connector.drain_sent(0).len(), 1);
}
