//! Best-effort fan-out of race notifications to WebSocket clients.
//!
//! Every client owns a bounded queue. Publishing never waits: a client
//! whose queue is full or closed is dropped and has to reconnect and
//! re-subscribe. Clients re-fetch authoritative state over HTTP, so a lost
//! message only delays a refresh.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use storage::dto::punch::{IngestOutcome, IngestStatus};
use storage::dto::results::StageResult;
use storage::models::Punch;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Finish,
    Speaker,
    Overlay,
    Admin,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Punch,
    Standings,
    Highlight,
    StageStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HighlightPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Live,
    Done,
}

/// Typed push message; serialized with a `type` tag.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    Punch {
        event_id: i64,
        punch: Punch,
        status: IngestStatus,
        stage_result: Option<StageResult>,
    },
    /// Overall results changed; clients re-fetch standings.
    Standings { event_id: i64, reason: String },
    Highlight {
        event_id: i64,
        text: String,
        priority: HighlightPriority,
    },
    StageStatus {
        event_id: i64,
        stage_id: i64,
        status: StageState,
    },
}

impl HubMessage {
    /// Punch notification; the stage result is withheld while standings are
    /// frozen.
    pub fn punch(outcome: IngestOutcome, standings_frozen: bool) -> Self {
        Self::Punch {
            event_id: outcome.punch.event_id,
            stage_result: if standings_frozen {
                None
            } else {
                outcome.stage_result
            },
            status: outcome.status,
            punch: outcome.punch,
        }
    }

    pub fn standings(event_id: i64, reason: &str) -> Self {
        Self::Standings {
            event_id,
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Punch { .. } => MessageKind::Punch,
            Self::Standings { .. } => MessageKind::Standings,
            Self::Highlight { .. } => MessageKind::Highlight,
            Self::StageStatus { .. } => MessageKind::StageStatus,
        }
    }

    pub fn event_id(&self) -> i64 {
        match self {
            Self::Punch { event_id, .. }
            | Self::Standings { event_id, .. }
            | Self::Highlight { event_id, .. }
            | Self::StageStatus { event_id, .. } => *event_id,
        }
    }

    /// Displays each kind is routed to.
    pub fn channels(&self) -> &'static [Channel] {
        match self.kind() {
            MessageKind::Punch => &[Channel::Finish, Channel::Speaker, Channel::Admin],
            MessageKind::Standings => &[
                Channel::Finish,
                Channel::Speaker,
                Channel::Overlay,
                Channel::Admin,
            ],
            MessageKind::Highlight => &[Channel::Speaker, Channel::Overlay],
            MessageKind::StageStatus => &[Channel::Overlay, Channel::Admin, Channel::Speaker],
        }
    }
}

/// What a client wants to receive. An empty `kinds` list means every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct Subscription {
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub kinds: Vec<MessageKind>,
    pub event_id: Option<i64>,
}

impl Subscription {
    fn matches(&self, channels: &[Channel], message: &HubMessage) -> bool {
        let channel_match = self.channels.contains(&Channel::All)
            || channels.contains(&Channel::All)
            || self.channels.iter().any(|c| channels.contains(c));

        channel_match
            && (self.kinds.is_empty() || self.kinds.contains(&message.kind()))
            && self.event_id.is_none_or(|id| id == message.event_id())
    }
}

struct Client {
    subscription: Subscription,
    tx: mpsc::Sender<Arc<str>>,
}

#[derive(Clone)]
pub struct Hub {
    clients: Arc<DashMap<Uuid, Client>>,
    buffer: usize,
}

impl Hub {
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Adds a client with no subscription; it receives nothing until it
    /// subscribes.
    pub fn connect(&self) -> (Uuid, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.clients.insert(
            id,
            Client {
                subscription: Subscription::default(),
                tx,
            },
        );
        tracing::debug!(client = %id, clients = self.clients.len(), "Hub client connected");
        (id, rx)
    }

    /// Replaces the client's subscription. Returns false for unknown clients.
    pub fn subscribe(&self, id: Uuid, subscription: Subscription) -> bool {
        match self.clients.get_mut(&id) {
            Some(mut client) => {
                client.subscription = subscription;
                true
            }
            None => false,
        }
    }

    pub fn disconnect(&self, id: Uuid) {
        if self.clients.remove(&id).is_some() {
            tracing::debug!(client = %id, clients = self.clients.len(), "Hub client disconnected");
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Sends to every client subscribed to one of `channels` (or `all`).
    /// Returns the number of clients the message was queued for.
    pub fn publish(&self, channels: &[Channel], message: &HubMessage) -> usize {
        let payload: Arc<str> = match serde_json::to_string(message) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize hub message");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dropped = Vec::new();

        for client in self.clients.iter() {
            if !client.subscription.matches(channels, message) {
                continue;
            }

            match client.tx.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                    dropped.push(*client.key());
                }
            }
        }

        for id in dropped {
            self.clients.remove(&id);
            tracing::warn!(client = %id, "Dropped slow or disconnected hub client");
        }

        delivered
    }

    /// Publishes on the message's default channels.
    pub fn broadcast(&self, message: HubMessage) -> usize {
        self.publish(message.channels(), &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribe(hub: &Hub, channels: &[Channel], event_id: Option<i64>) -> (Uuid, mpsc::Receiver<Arc<str>>) {
        let (id, rx) = hub.connect();
        hub.subscribe(
            id,
            Subscription {
                channels: channels.to_vec(),
                kinds: Vec::new(),
                event_id,
            },
        );
        (id, rx)
    }

    #[test]
    fn test_routing_by_channel() {
        let hub = Hub::new(8);
        let (_, mut overlay) = subscribe(&hub, &[Channel::Overlay], None);
        let (_, mut finish) = subscribe(&hub, &[Channel::Finish], None);
        let (_, mut all) = subscribe(&hub, &[Channel::All], None);

        let delivered = hub.broadcast(HubMessage::Highlight {
            event_id: 1,
            text: "Bib 101 leads".to_string(),
            priority: HighlightPriority::High,
        });

        assert_eq!(delivered, 2);
        assert!(overlay.try_recv().unwrap().contains("\"type\":\"highlight\""));
        assert!(finish.try_recv().is_err());
        assert!(all.try_recv().is_ok());
    }

    #[test]
    fn test_unsubscribed_client_receives_nothing() {
        let hub = Hub::new(8);
        let (_, mut rx) = hub.connect();

        assert_eq!(hub.broadcast(HubMessage::standings(1, "recompute")), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_and_kind_filters() {
        let hub = Hub::new(8);
        let (_, mut other_event) = subscribe(&hub, &[Channel::Speaker], Some(2));
        let (id, mut standings_only) = hub.connect();
        hub.subscribe(
            id,
            Subscription {
                channels: vec![Channel::Speaker],
                kinds: vec![MessageKind::Standings],
                event_id: None,
            },
        );

        hub.broadcast(HubMessage::Highlight {
            event_id: 1,
            text: "x".to_string(),
            priority: HighlightPriority::Low,
        });
        assert!(other_event.try_recv().is_err());
        assert!(standings_only.try_recv().is_err());

        hub.broadcast(HubMessage::standings(1, "punch"));
        assert!(standings_only.try_recv().is_ok());
    }

    #[test]
    fn test_full_client_is_dropped_without_blocking() {
        let hub = Hub::new(1);
        let (_, _slow) = subscribe(&hub, &[Channel::All], None);
        let (_, mut fast) = subscribe(&hub, &[Channel::All], None);

        assert_eq!(hub.broadcast(HubMessage::standings(1, "a")), 2);
        fast.try_recv().unwrap();

        assert_eq!(hub.broadcast(HubMessage::standings(1, "b")), 1);
        assert_eq!(hub.client_count(), 1);
    }

    #[test]
    fn test_closed_client_is_dropped() {
        let hub = Hub::new(4);
        let (_, rx) = subscribe(&hub, &[Channel::Admin], None);
        drop(rx);

        assert_eq!(hub.broadcast(HubMessage::standings(1, "x")), 0);
        assert_eq!(hub.client_count(), 0);
    }
}
