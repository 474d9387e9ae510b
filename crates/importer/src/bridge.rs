use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::dto::punch::NewPunch;
use storage::models::PunchSource;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{ImporterError, Result};
use crate::traits::{PunchProvider, PunchSink};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum BridgeStatus {
    Stopped,
    PollingOk,
    PollingError(String),
}

/// Observable state of a bridge.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeSnapshot {
    pub provider: &'static str,
    pub competition: Option<String>,
    pub status: BridgeStatus,
    pub running: bool,
    pub punch_count: u64,
    pub error_count: u64,
    pub last_poll: Option<DateTime<Utc>>,
    /// Cursor: the last provider record id handed to ingestion.
    pub last_id: Option<i64>,
}

#[derive(Debug)]
struct BridgeState {
    competition: Option<String>,
    status: BridgeStatus,
    punch_count: u64,
    error_count: u64,
    last_poll: Option<DateTime<Utc>>,
    last_id: Option<i64>,
}

struct Inner {
    provider: Arc<dyn PunchProvider>,
    sink: Arc<dyn PunchSink>,
    state: RwLock<BridgeState>,
}

/// Polls one external provider competition and forwards new punches.
///
/// A transport or provider failure is logged and counted and leaves the
/// cursor where it was, so the next tick retries the same window. A punch
/// the sink rejects is counted as an error and skipped; a punch the sink
/// could not store halts the batch before it, so it is fetched again.
pub struct Bridge {
    inner: Arc<Inner>,
    interval: Duration,
    running: Mutex<Option<CancellationToken>>,
}

impl Bridge {
    pub fn new(provider: Arc<dyn PunchProvider>, sink: Arc<dyn PunchSink>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                sink,
                state: RwLock::new(BridgeState {
                    competition: None,
                    status: BridgeStatus::Stopped,
                    punch_count: 0,
                    error_count: 0,
                    last_poll: None,
                    last_id: None,
                }),
            }),
            interval,
            running: Mutex::new(None),
        }
    }

    /// Points the bridge at a competition. Switching competitions resets
    /// the cursor and counters; a running loop uses it from its next poll.
    pub async fn configure(&self, competition: &str) {
        let mut state = self.inner.state.write().await;
        if state.competition.as_deref() == Some(competition) {
            return;
        }

        tracing::info!(provider = self.inner.provider.name(), competition, "Bridge configured");
        state.competition = Some(competition.to_string());
        state.punch_count = 0;
        state.error_count = 0;
        state.last_poll = None;
        state.last_id = None;
    }

    /// Starts polling. Starting a running bridge is a no-op.
    pub async fn start(&self, competition: Option<&str>) -> Result<BridgeSnapshot> {
        if let Some(competition) = competition {
            self.configure(competition).await;
        }

        let mut running = self.running.lock().await;
        if running.is_some() {
            drop(running);
            return Ok(self.status().await);
        }

        let competition = self
            .inner
            .state
            .read()
            .await
            .competition
            .clone()
            .ok_or(ImporterError::NotConfigured)?;

        let token = CancellationToken::new();
        tokio::spawn(run(self.inner.clone(), self.interval, token.clone()));
        *running = Some(token);
        drop(running);

        tracing::info!(provider = self.inner.provider.name(), %competition, "Bridge started");
        Ok(self.status().await)
    }

    /// Stops polling immediately. Stopping a stopped bridge is a no-op.
    pub async fn stop(&self) -> BridgeSnapshot {
        if let Some(token) = self.running.lock().await.take() {
            token.cancel();
            self.inner.state.write().await.status = BridgeStatus::Stopped;
            tracing::info!(provider = self.inner.provider.name(), "Bridge stopped");
        }
        self.status().await
    }

    pub async fn status(&self) -> BridgeSnapshot {
        let running = self.running.lock().await.is_some();
        let state = self.inner.state.read().await;

        BridgeSnapshot {
            provider: self.inner.provider.name(),
            competition: state.competition.clone(),
            status: state.status.clone(),
            running,
            punch_count: state.punch_count,
            error_count: state.error_count,
            last_poll: state.last_poll,
            last_id: state.last_id,
        }
    }

    /// One fetch-and-forward cycle; returns the number of punches accepted
    /// by the sink.
    pub async fn poll_once(&self) -> Result<usize> {
        poll(&self.inner, None).await
    }
}

async fn run(inner: Arc<Inner>, interval: Duration, token: CancellationToken) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = token.cancelled() => break,
            result = poll(&inner, Some(&token)) => {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "Bridge poll failed");
                }
            }
        }
    }
}

/// Status is left alone once `token` is cancelled so a poll racing with
/// `stop` cannot overwrite `Stopped`.
async fn poll(inner: &Inner, token: Option<&CancellationToken>) -> Result<usize> {
    let live = || token.is_none_or(|t| !t.is_cancelled());

    let (competition, cursor) = {
        let state = inner.state.read().await;
        let competition = state.competition.clone().ok_or(ImporterError::NotConfigured)?;
        (competition, state.last_id)
    };

    let fetched = match inner.provider.fetch(&competition, cursor).await {
        Ok(punches) => punches,
        Err(e) => {
            let mut state = inner.state.write().await;
            state.error_count += 1;
            state.last_poll = Some(Utc::now());
            if live() {
                state.status = BridgeStatus::PollingError(e.to_string());
            }
            tracing::warn!(
                provider = inner.provider.name(),
                %competition,
                errors = state.error_count,
                error = %e,
                "Bridge poll failed; cursor unchanged"
            );
            return Err(e);
        }
    };

    let mut accepted = 0;
    let mut rejected = 0;
    let mut last_id = cursor;
    let mut halted = None;

    for punch in fetched {
        if cursor.is_some_and(|c| punch.id <= c) {
            continue;
        }

        let record = NewPunch {
            siac: punch.siac,
            control_code: punch.control_code,
            timestamp: punch.timestamp,
            source: PunchSource::ExternalBridge,
        };

        match inner.sink.record(record).await {
            Ok(()) => accepted += 1,
            Err(e) if e.is_rejection() => {
                rejected += 1;
                tracing::error!(provider = inner.provider.name(), record_id = punch.id, error = %e, "Bridged punch rejected");
            }
            Err(e) => {
                rejected += 1;
                tracing::error!(
                    provider = inner.provider.name(),
                    record_id = punch.id,
                    error = %e,
                    "Bridged punch not stored; batch halted at cursor {:?}",
                    last_id
                );
                halted = Some(e);
                break;
            }
        }
        last_id = Some(punch.id);
    }

    let mut state = inner.state.write().await;
    state.punch_count += accepted as u64;
    state.error_count += rejected;
    state.last_poll = Some(Utc::now());
    state.last_id = last_id;

    if let Some(e) = halted {
        if live() {
            state.status = BridgeStatus::PollingError(e.to_string());
        }
        return Err(e);
    }

    if live() {
        state.status = BridgeStatus::PollingOk;
    }

    if accepted > 0 {
        tracing::info!(provider = inner.provider.name(), %competition, accepted, last_id, "Bridged punches recorded");
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use storage::error::StorageError;

    use super::*;
    use crate::traits::ProviderPunch;

    #[derive(Default)]
    struct ScriptedProvider {
        replies: StdMutex<VecDeque<Result<Vec<ProviderPunch>>>>,
        cursors: StdMutex<Vec<Option<i64>>>,
    }

    impl ScriptedProvider {
        fn reply(&self, reply: Result<Vec<ProviderPunch>>) {
            self.replies.lock().unwrap().push_back(reply);
        }
    }

    #[async_trait::async_trait]
    impl PunchProvider for ScriptedProvider {
        async fn fetch(&self, _competition: &str, after: Option<i64>) -> Result<Vec<ProviderPunch>> {
            self.cursors.lock().unwrap().push(after);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        punches: StdMutex<Vec<NewPunch>>,
        outage: StdMutex<Option<String>>,
    }

    impl CollectingSink {
        fn fail_next_with_io(&self, message: &str) {
            *self.outage.lock().unwrap() = Some(message.to_string());
        }
    }

    #[async_trait::async_trait]
    impl PunchSink for CollectingSink {
        async fn record(&self, punch: NewPunch) -> Result<()> {
            if let Some(message) = self.outage.lock().unwrap().take() {
                return Err(StorageError::Io(std::io::Error::other(message)).into());
            }
            if punch.control_code == 0 {
                return Err(ImporterError::ProviderError("unknown control".to_string()));
            }
            self.punches.lock().unwrap().push(punch);
            Ok(())
        }
    }

    fn punch(id: i64, code: i64) -> ProviderPunch {
        ProviderPunch {
            id,
            control_code: code,
            siac: "8001".to_string(),
            timestamp: format!("2025-06-14 10:00:{:02}", id % 60),
        }
    }

    fn bridge() -> (Bridge, Arc<ScriptedProvider>, Arc<CollectingSink>) {
        let provider = Arc::new(ScriptedProvider::default());
        let sink = Arc::new(CollectingSink::default());
        let bridge = Bridge::new(provider.clone(), sink.clone(), Duration::from_millis(20));
        (bridge, provider, sink)
    }

    #[tokio::test]
    async fn test_cursor_advances_and_only_new_records_forwarded() {
        let (bridge, provider, sink) = bridge();
        bridge.configure("1234").await;

        provider.reply(Ok(vec![punch(1, 31), punch(2, 32)]));
        provider.reply(Ok(vec![punch(2, 32), punch(3, 31)]));

        assert_eq!(bridge.poll_once().await.unwrap(), 2);
        assert_eq!(bridge.poll_once().await.unwrap(), 1);

        assert_eq!(*provider.cursors.lock().unwrap(), vec![None, Some(2)]);
        assert_eq!(sink.punches.lock().unwrap().len(), 3);
        assert!(
            sink.punches
                .lock()
                .unwrap()
                .iter()
                .all(|p| p.source == PunchSource::ExternalBridge)
        );

        let status = bridge.status().await;
        assert_eq!(status.punch_count, 3);
        assert_eq!(status.last_id, Some(3));
        assert_eq!(status.status, BridgeStatus::PollingOk);
    }

    #[tokio::test]
    async fn test_provider_error_keeps_cursor() {
        let (bridge, provider, _sink) = bridge();
        bridge.configure("1234").await;

        provider.reply(Ok(vec![punch(5, 31)]));
        provider.reply(Err(ImporterError::ProviderError("timeout".to_string())));
        provider.reply(Ok(vec![punch(6, 32)]));

        bridge.poll_once().await.unwrap();
        assert!(bridge.poll_once().await.is_err());

        let status = bridge.status().await;
        assert_eq!(status.error_count, 1);
        assert_eq!(status.last_id, Some(5));
        assert!(matches!(status.status, BridgeStatus::PollingError(ref d) if d.contains("timeout")));

        bridge.poll_once().await.unwrap();
        assert_eq!(*provider.cursors.lock().unwrap(), vec![None, Some(5), Some(5)]);
        assert_eq!(bridge.status().await.status, BridgeStatus::PollingOk);
    }

    #[tokio::test]
    async fn test_rejected_punch_is_counted_and_skipped() {
        let (bridge, provider, sink) = bridge();
        bridge.configure("1234").await;
        provider.reply(Ok(vec![punch(1, 0), punch(2, 31)]));

        assert_eq!(bridge.poll_once().await.unwrap(), 1);
        let status = bridge.status().await;
        assert_eq!(status.error_count, 1);
        assert_eq!(status.last_id, Some(2));
        assert_eq!(sink.punches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unstored_punch_halts_batch_and_is_refetched() {
        let (bridge, provider, sink) = bridge();
        bridge.configure("1234").await;
        sink.fail_next_with_io("database is locked");

        provider.reply(Ok(vec![punch(1, 31), punch(2, 32)]));
        provider.reply(Ok(vec![punch(1, 31), punch(2, 32)]));

        assert!(bridge.poll_once().await.is_err());
        let status = bridge.status().await;
        assert_eq!(status.error_count, 1);
        assert_eq!(status.last_id, None);
        assert!(matches!(status.status, BridgeStatus::PollingError(ref d) if d.contains("database is locked")));
        assert!(sink.punches.lock().unwrap().is_empty());

        assert_eq!(bridge.poll_once().await.unwrap(), 2);
        assert_eq!(*provider.cursors.lock().unwrap(), vec![None, None]);
        assert_eq!(bridge.status().await.last_id, Some(2));
        assert_eq!(bridge.status().await.status, BridgeStatus::PollingOk);
    }

    #[tokio::test]
    async fn test_start_requires_competition() {
        let (bridge, _provider, _sink) = bridge();
        assert!(matches!(bridge.start(None).await, Err(ImporterError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_start_stop_are_idempotent() {
        let (bridge, provider, sink) = bridge();
        provider.reply(Ok(vec![punch(1, 31)]));

        assert!(bridge.start(Some("1234")).await.unwrap().running);
        assert!(bridge.start(None).await.unwrap().running);

        for _ in 0..50 {
            if !sink.punches.lock().unwrap().is_empty() {
                break;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.punches.lock().unwrap().len(), 1);

        let stopped = bridge.stop().await;
        assert!(!stopped.running);
        assert_eq!(stopped.status, BridgeStatus::Stopped);
        assert_eq!(bridge.stop().await.status, BridgeStatus::Stopped);
    }
}
