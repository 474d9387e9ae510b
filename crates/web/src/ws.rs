//! WebSocket endpoint for the broadcast hub.
//!
//! A client connects, sends
//! `{"action":"subscribe","channels":["speaker"],"kinds":["highlight"],"event_id":1}`
//! and receives typed messages until it disconnects. Sending another
//! subscribe replaces the subscription. Nothing is replayed on reconnect.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::hub::{Hub, Subscription};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientRequest {
    Subscribe(Subscription),
    Ping,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, state.hub))
}

async fn serve(socket: WebSocket, hub: Hub) {
    let (id, mut outbox) = hub.connect();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            queued = outbox.recv() => {
                // None: the hub dropped this client as too slow.
                let Some(payload) = queued else { break };
                if sender.send(Message::Text(payload.to_string())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_request(&hub, id, &text);
                    if sender.send(Message::Text(reply)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    }

    hub.disconnect(id);
}

fn handle_request(hub: &Hub, id: Uuid, text: &str) -> String {
    match serde_json::from_str::<ClientRequest>(text) {
        Ok(ClientRequest::Subscribe(subscription)) => {
            tracing::debug!(client = %id, channels = ?subscription.channels, "Hub client subscribed");
            let reply = json!({
                "type": "subscribed",
                "channels": subscription.channels,
                "kinds": subscription.kinds,
                "event_id": subscription.event_id,
            });
            hub.subscribe(id, subscription);
            reply.to_string()
        }
        Ok(ClientRequest::Ping) => json!({ "type": "pong" }).to_string(),
        Err(e) => json!({ "type": "error", "message": e.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{Channel, HubMessage};

    #[test]
    fn test_subscribe_request_routes_messages() {
        let hub = Hub::new(4);
        let (id, mut rx) = hub.connect();

        let reply = handle_request(
            &hub,
            id,
            r#"{"action":"subscribe","channels":["overlay"],"event_id":3}"#,
        );
        assert!(reply.contains("\"type\":\"subscribed\""));

        hub.broadcast(HubMessage::standings(3, "punch"));
        hub.broadcast(HubMessage::standings(4, "punch"));

        assert!(rx.try_recv().unwrap().contains("\"event_id\":3"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_resubscribe_replaces_channels() {
        let hub = Hub::new(4);
        let (id, mut rx) = hub.connect();

        handle_request(&hub, id, r#"{"action":"subscribe","channels":["finish"]}"#);
        handle_request(&hub, id, r#"{"action":"subscribe","channels":["overlay"]}"#);

        hub.publish(&[Channel::Finish], &HubMessage::standings(1, "punch"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_bad_request_gets_error_reply() {
        let hub = Hub::new(4);
        let (id, _rx) = hub.connect();

        let reply = handle_request(&hub, id, r#"{"action":"subscribe","channels":["lobby"]}"#);
        assert!(reply.contains("\"type\":\"error\""));

        let pong = handle_request(&hub, id, r#"{"action":"ping"}"#);
        assert_eq!(pong, r#"{"type":"pong"}"#);
    }
}
