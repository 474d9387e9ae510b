use std::sync::Arc;

use async_trait::async_trait;
use importer::{Bridge, BridgeSnapshot, PunchSink, RocClient};
use serde_json::json;
use storage::{
    Database,
    dto::audit::NewAuditEntry,
    dto::punch::NewPunch,
    repository::event::EventRepository,
    services::IngestSettings,
};

use crate::error::WebResult;
use crate::features::audit::services as audit;
use crate::features::punches::services::create_punch;
use crate::hub::Hub;
use crate::state::AppState;

/// Feeds bridged punches into the regular ingestion path of one event.
pub struct IngestSink {
    pub db: Database,
    pub hub: Hub,
    pub settings: IngestSettings,
    pub event_id: i64,
}

#[async_trait]
impl PunchSink for IngestSink {
    async fn record(&self, punch: NewPunch) -> importer::Result<()> {
        create_punch(&self.db, &self.hub, self.settings, self.event_id, punch).await?;
        Ok(())
    }
}

/// The event's bridge, created against the ROC feed on first use
pub async fn bridge_for(state: &AppState, event_id: i64) -> WebResult<Arc<Bridge>> {
    EventRepository::new(state.db.pool()).find_by_id(event_id).await?;

    if let Some(bridge) = state.bridges.get(&event_id) {
        return Ok(bridge.value().clone());
    }

    let provider = Arc::new(RocClient::new(state.config.roc_base_url.clone())?);
    let sink = Arc::new(IngestSink {
        db: state.db.clone(),
        hub: state.hub.clone(),
        settings: state.ingest_settings(),
        event_id,
    });
    let bridge = Arc::new(Bridge::new(provider, sink, state.config.bridge_poll_interval));

    Ok(state.bridges.entry(event_id).or_insert(bridge).value().clone())
}

pub async fn status(state: &AppState, event_id: i64) -> WebResult<BridgeSnapshot> {
    Ok(bridge_for(state, event_id).await?.status().await)
}

pub async fn configure(state: &AppState, event_id: i64, competition: &str) -> WebResult<BridgeSnapshot> {
    let bridge = bridge_for(state, event_id).await?;
    bridge.configure(competition).await;

    audit_bridge(&state.db, event_id, "bridge.configure", Some(competition)).await?;
    Ok(bridge.status().await)
}

pub async fn start(state: &AppState, event_id: i64, competition: Option<&str>) -> WebResult<BridgeSnapshot> {
    let snapshot = bridge_for(state, event_id).await?.start(competition).await?;

    audit_bridge(&state.db, event_id, "bridge.start", snapshot.competition.as_deref()).await?;
    Ok(snapshot)
}

/// Stopping a stopped bridge is a no-op
pub async fn stop(state: &AppState, event_id: i64) -> WebResult<BridgeSnapshot> {
    let bridge = bridge_for(state, event_id).await?;
    let was_running = bridge.status().await.running;
    let snapshot = bridge.stop().await;

    if was_running {
        audit_bridge(&state.db, event_id, "bridge.stop", snapshot.competition.as_deref()).await?;
    }
    Ok(snapshot)
}

async fn audit_bridge(db: &Database, event_id: i64, action: &str, competition: Option<&str>) -> WebResult<()> {
    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), action, "bridge")
            .entity(event_id)
            .details(&json!({ "competition": competition })),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use importer::{ProviderPunch, PunchProvider};
    use storage::dto::punch::PunchFilter;
    use storage::repository::punch::PunchRepository;

    use super::*;
    use crate::hub::{Channel, Subscription};
    use crate::testing::seed_event;

    struct FixedProvider(Vec<ProviderPunch>);

    #[async_trait]
    impl PunchProvider for FixedProvider {
        async fn fetch(&self, _competition: &str, after: Option<i64>) -> importer::Result<Vec<ProviderPunch>> {
            Ok(self
                .0
                .iter()
                .filter(|p| after.is_none_or(|id| p.id > id))
                .cloned()
                .collect())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn provider_punch(id: i64, code: i64, siac: &str, time: &str) -> ProviderPunch {
        ProviderPunch {
            id,
            control_code: code,
            siac: siac.to_string(),
            timestamp: time.to_string(),
        }
    }

    #[tokio::test]
    async fn test_bridged_punches_use_ingest_path() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::test_state(dir.path()).await;
        let seeded = seed_event(&state).await;

        let (client, mut rx) = state.hub.connect();
        state.hub.subscribe(
            client,
            Subscription {
                channels: vec![Channel::Finish],
                kinds: Vec::new(),
                event_id: Some(seeded.event_id),
            },
        );

        let provider = Arc::new(FixedProvider(vec![
            provider_punch(7, 31, "8001", "2025-06-14 10:00:00.0"),
            provider_punch(8, 32, "8001", "2025-06-14 10:02:05.0"),
            provider_punch(9, 32, "8001", "2025-06-14 10:02:06.0"),
        ]));
        let sink = Arc::new(IngestSink {
            db: state.db.clone(),
            hub: state.hub.clone(),
            settings: state.ingest_settings(),
            event_id: seeded.event_id,
        });
        let bridge = Bridge::new(provider, sink, Duration::from_secs(3600));
        bridge.configure("roc-42").await;

        assert_eq!(bridge.poll_once().await.unwrap(), 3);

        let punches = PunchRepository::new(state.db.pool())
            .list(seeded.event_id, &PunchFilter::default())
            .await
            .unwrap();
        assert_eq!(punches.len(), 3);
        assert!(punches.iter().all(|p| p.source == storage::models::PunchSource::ExternalBridge));
        // newest first
        assert!(punches[0].is_duplicate);
        assert_eq!(punches.iter().filter(|p| p.is_duplicate).count(), 1);

        let mut punch_messages = 0;
        while let Ok(message) = rx.try_recv() {
            if message.contains("\"type\":\"punch\"") {
                punch_messages += 1;
            }
        }
        assert_eq!(punch_messages, 2);

        let snapshot = bridge.status().await;
        assert_eq!(snapshot.last_id, Some(9));
        assert_eq!(snapshot.error_count, 0);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::test_state(dir.path()).await;
        let seeded = seed_event(&state).await;

        let snapshot = stop(&state, seeded.event_id).await.unwrap();
        assert!(!snapshot.running);
        assert_eq!(state.bridges.len(), 1);

        let again = stop(&state, seeded.event_id).await.unwrap();
        assert!(!again.running);
    }

    #[tokio::test]
    async fn test_start_requires_competition() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::test_state(dir.path()).await;
        let seeded = seed_event(&state).await;

        let err = start(&state, seeded.event_id, None).await.unwrap_err();
        assert!(matches!(err, crate::error::WebError::Importer(importer::ImporterError::NotConfigured)));
    }
}
