use chrono::Utc;
use serde_json::json;

use super::ingest::{IngestSettings, resume_ingest};
use super::overall::compute_overall;
use super::snapshot::ResultsSnapshot;
use super::stage_results::compute_stage_results;
use crate::Database;
use crate::dto::audit::NewAuditEntry;
use crate::dto::punch::IngestOutcome;
use crate::dto::race_state::RaceStateResponse;
use crate::dto::results::{OverallResult, RecomputeReport, StandingsResponse, StatusCounts};
use crate::error::{Result, StorageError};
use crate::models::{Event, EventStatus};
use crate::repository::audit::AuditRepository;
use crate::repository::event::EventRepository;
use crate::repository::punch::PunchRepository;
use crate::repository::race_state::RaceStateRepository;

/// Race-day control plane: event lifecycle plus the ingest and standings
/// gates. Every action is audited.
pub struct RaceControl<'a> {
    db: &'a Database,
    settings: IngestSettings,
}

impl<'a> RaceControl<'a> {
    pub fn new(db: &'a Database, settings: IngestSettings) -> Self {
        Self { db, settings }
    }

    pub async fn activate(&self, event_id: i64) -> Result<Event> {
        self.transition(event_id, EventStatus::Active, "event.activate").await
    }

    pub async fn finish(&self, event_id: i64) -> Result<Event> {
        self.transition(event_id, EventStatus::Finished, "event.finish").await
    }

    async fn transition(&self, event_id: i64, next: EventStatus, action: &str) -> Result<Event> {
        let events = EventRepository::new(self.db.pool());
        let event = events.find_by_id(event_id).await?;

        if !event.status.can_transition_to(next) {
            return Err(StorageError::InvalidTransition(format!(
                "cannot move event {event_id} from {} to {next}",
                event.status
            )));
        }

        let updated = events.set_status(event_id, next).await?;
        self.audit(
            NewAuditEntry::new(Some(event_id), action, "event")
                .entity(event_id)
                .details(&json!({ "from": event.status, "to": next })),
        )
        .await?;

        tracing::info!(event_id, from = %event.status, to = %next, "Event status changed");
        Ok(updated)
    }

    /// Closes the ingest gate. Pausing a paused event is a no-op.
    pub async fn pause_ingest(&self, event_id: i64) -> Result<RaceStateResponse> {
        EventRepository::new(self.db.pool()).find_by_id(event_id).await?;

        {
            let _guard = self.db.lock_ingest().await;
            let mut conn = self.db.pool().acquire().await?;
            RaceStateRepository::set_paused(&mut conn, event_id, true).await?;
        }

        self.audit(NewAuditEntry::new(Some(event_id), "ingest.pause", "race_state").entity(event_id))
            .await?;
        tracing::info!(event_id, "Ingest paused");

        self.race_state(event_id).await
    }

    /// Reopens the ingest gate and drains the deferred backlog.
    pub async fn resume_ingest(&self, event_id: i64) -> Result<Vec<IngestOutcome>> {
        EventRepository::new(self.db.pool()).find_by_id(event_id).await?;

        let outcomes = resume_ingest(self.db, self.settings, event_id).await?;

        self.audit(
            NewAuditEntry::new(Some(event_id), "ingest.resume", "race_state")
                .entity(event_id)
                .details(&json!({ "deferred_processed": outcomes.len() })),
        )
        .await?;
        tracing::info!(event_id, processed = outcomes.len(), "Ingest resumed");

        Ok(outcomes)
    }

    /// Captures the current overall standings and serves them until unfrozen.
    /// Freezing a frozen event keeps the original snapshot.
    pub async fn freeze_standings(&self, event_id: i64) -> Result<RaceStateResponse> {
        let state = RaceStateRepository::new(self.db.pool()).get(event_id).await?;
        if state.standings_frozen {
            return self.race_state(event_id).await;
        }

        let snapshot = ResultsSnapshot::load(self.db, event_id).await?;
        let standings = compute_overall(&snapshot, None);
        let frozen_at = Utc::now().naive_utc();

        RaceStateRepository::new(self.db.pool())
            .set_frozen(event_id, Some(frozen_at), Some(serde_json::to_string(&standings)?))
            .await?;

        self.audit(
            NewAuditEntry::new(Some(event_id), "standings.freeze", "race_state")
                .entity(event_id)
                .details(&json!({ "frozen_at": frozen_at, "results": standings.len() })),
        )
        .await?;
        tracing::info!(event_id, %frozen_at, "Standings frozen");

        self.race_state(event_id).await
    }

    pub async fn unfreeze_standings(&self, event_id: i64) -> Result<RaceStateResponse> {
        EventRepository::new(self.db.pool()).find_by_id(event_id).await?;

        RaceStateRepository::new(self.db.pool())
            .set_frozen(event_id, None, None)
            .await?;

        self.audit(NewAuditEntry::new(Some(event_id), "standings.unfreeze", "race_state").entity(event_id))
            .await?;
        tracing::info!(event_id, "Standings unfrozen");

        self.race_state(event_id).await
    }

    pub async fn race_state(&self, event_id: i64) -> Result<RaceStateResponse> {
        let event = EventRepository::new(self.db.pool()).find_by_id(event_id).await?;
        let state = RaceStateRepository::new(self.db.pool()).get(event_id).await?;
        let deferred = PunchRepository::new(self.db.pool())
            .count_deferred(event_id)
            .await?;

        Ok(RaceStateResponse {
            event_id,
            status: event.status,
            ingest_paused: state.ingest_paused,
            standings_frozen: state.standings_frozen,
            frozen_at: state.frozen_at,
            deferred_punches: deferred,
        })
    }

    /// Overall standings as published: the freeze snapshot while frozen,
    /// unless `live` asks for the current log.
    pub async fn standings(
        &self,
        event_id: i64,
        class_filter: Option<i64>,
        live: bool,
    ) -> Result<StandingsResponse> {
        let state = RaceStateRepository::new(self.db.pool()).get(event_id).await?;

        if state.standings_frozen
            && !live
            && let Some(raw) = &state.frozen_snapshot
        {
            EventRepository::new(self.db.pool()).find_by_id(event_id).await?;
            let frozen: Vec<OverallResult> = serde_json::from_str(raw)?;

            return Ok(StandingsResponse {
                event_id,
                frozen: true,
                frozen_at: state.frozen_at,
                results: frozen
                    .into_iter()
                    .filter(|row| class_filter.is_none_or(|class_id| row.class_id == class_id))
                    .collect(),
            });
        }

        let snapshot = ResultsSnapshot::load(self.db, event_id).await?;
        Ok(StandingsResponse {
            event_id,
            frozen: state.standings_frozen,
            frozen_at: state.frozen_at,
            results: compute_overall(&snapshot, class_filter),
        })
    }

    /// Recomputes every stage and the overall standings from one consistent
    /// snapshot of the log. Nothing is written except the audit entry, so a
    /// failed run can always be retried.
    pub async fn recompute(&self, event_id: i64) -> Result<RecomputeReport> {
        let snapshot = ResultsSnapshot::load(self.db, event_id).await?;

        let mut stage_counts = StatusCounts::default();
        for stage in &snapshot.stages {
            for row in compute_stage_results(&snapshot, stage.stage_id, None)? {
                stage_counts.add(row.status);
            }
        }

        let mut overall_counts = StatusCounts::default();
        for row in compute_overall(&snapshot, None) {
            overall_counts.add(row.status);
        }

        let report = RecomputeReport {
            event_id,
            stages: snapshot.stages.len(),
            stage_results: stage_counts,
            overall: overall_counts,
            punches_considered: snapshot.punches.len(),
        };

        self.audit(
            NewAuditEntry::new(Some(event_id), "results.recompute", "event")
                .entity(event_id)
                .details(&report),
        )
        .await?;
        tracing::info!(event_id, stages = report.stages, punches = report.punches_considered, "Results recomputed");

        Ok(report)
    }

    async fn audit(&self, entry: NewAuditEntry) -> Result<()> {
        AuditRepository::new(self.db.pool()).append(&entry).await?;
        Ok(())
    }
}
