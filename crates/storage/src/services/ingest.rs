use sqlx::SqliteConnection;

use super::dedup::{DEFAULT_DEDUP_WINDOW_MS, is_duplicate};
use super::snapshot::ResultsSnapshot;
use super::stage_results::compute_stage_results;
use crate::Database;
use crate::dto::audit::NewAuditEntry;
use crate::dto::punch::{IngestOutcome, IngestStatus, NewPunch};
use crate::dto::results::StageResult;
use crate::error::{Result, StorageError};
use crate::models::{Event, EventStatus, Punch, PunchSource};
use crate::repository::audit::AuditRepository;
use crate::repository::punch::PunchRepository;
use crate::repository::race_state::RaceStateRepository;

#[derive(Debug, Clone, Copy)]
pub struct IngestSettings {
    pub dedup_window_ms: i64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            dedup_window_ms: DEFAULT_DEDUP_WINDOW_MS,
        }
    }
}

/// Records one punch through the single ingestion path.
///
/// The punch is always stored. While ingest is paused it is left
/// unprocessed and reported as deferred; otherwise it is classified against
/// the processed originals of the same transponder and control inside the
/// ingest lock, so concurrent producers cannot both insert an original.
pub async fn record_punch(
    db: &Database,
    settings: IngestSettings,
    event_id: i64,
    punch: NewPunch,
) -> Result<IngestOutcome> {
    let siac = punch.siac.trim();
    if siac.is_empty() {
        return Err(StorageError::validation("siac", "transponder id is required"));
    }

    let (stored, status) = {
        let _guard = db.lock_ingest().await;
        let mut tx = db.pool().begin().await?;

        let event = load_event(&mut tx, event_id).await?;
        if event.status == EventStatus::Finished {
            return Err(StorageError::InvalidTransition(format!(
                "event {event_id} is finished and no longer accepts punches"
            )));
        }

        let punch_time = event
            .time_precision
            .parse_timestamp(&punch.timestamp, event.event_date)
            .ok_or_else(|| {
                StorageError::validation(
                    "timestamp",
                    format!("'{}' is not a valid punch time", punch.timestamp),
                )
            })?;

        ensure_control(&mut tx, event_id, punch.control_code).await?;

        let state = RaceStateRepository::get_in(&mut tx, event_id).await?;

        let (is_dup, processed, status) = if state.ingest_paused {
            (false, false, IngestStatus::Deferred)
        } else {
            let originals =
                PunchRepository::original_times(&mut tx, event_id, siac, punch.control_code).await?;
            if is_duplicate(punch_time, &originals, settings.dedup_window_ms) {
                (true, true, IngestStatus::Duplicate)
            } else {
                (false, true, IngestStatus::Accepted)
            }
        };

        let stored = PunchRepository::insert(
            &mut tx,
            event_id,
            siac,
            punch.control_code,
            punch_time,
            punch.source,
            is_dup,
            processed,
        )
        .await?;

        tx.commit().await?;
        (stored, status)
    };

    match status {
        IngestStatus::Accepted => tracing::debug!(
            event_id,
            punch_id = stored.punch_id,
            siac = %stored.siac,
            control_code = stored.control_code,
            "Punch accepted"
        ),
        IngestStatus::Duplicate => tracing::info!(
            event_id,
            punch_id = stored.punch_id,
            siac = %stored.siac,
            control_code = stored.control_code,
            "Duplicate punch stored and excluded"
        ),
        IngestStatus::Deferred => tracing::info!(
            event_id,
            punch_id = stored.punch_id,
            "Ingest paused; punch deferred"
        ),
    }

    if stored.source == PunchSource::Manual {
        AuditRepository::new(db.pool())
            .append(
                &NewAuditEntry::new(Some(event_id), "punch.create", "punch")
                    .entity(stored.punch_id)
                    .details(&stored),
            )
            .await?;
    }

    let stage_result = match status {
        IngestStatus::Accepted => stage_consequence(db, &stored).await?,
        _ => None,
    };

    Ok(IngestOutcome {
        punch: stored,
        status,
        stage_result,
    })
}

/// Reopens ingest and processes every deferred punch in submission order.
///
/// The gate is cleared in the same transaction and under the ingest lock,
/// so punches arriving while the backlog drains are classified after it.
/// Resuming an event that is not paused processes nothing.
pub async fn resume_ingest(
    db: &Database,
    settings: IngestSettings,
    event_id: i64,
) -> Result<Vec<IngestOutcome>> {
    let processed = {
        let _guard = db.lock_ingest().await;
        let mut tx = db.pool().begin().await?;

        RaceStateRepository::set_paused(&mut tx, event_id, false).await?;
        let deferred = PunchRepository::deferred(&mut tx, event_id).await?;
        let mut processed = Vec::with_capacity(deferred.len());

        for punch in deferred {
            let originals =
                PunchRepository::original_times(&mut tx, event_id, &punch.siac, punch.control_code)
                    .await?;
            let dup = is_duplicate(punch.punch_time, &originals, settings.dedup_window_ms);
            processed.push(PunchRepository::mark_processed(&mut tx, punch.punch_id, dup).await?);
        }

        tx.commit().await?;
        processed
    };

    if !processed.is_empty() {
        tracing::info!(event_id, count = processed.len(), "Deferred punches processed");
    }

    let snapshot = match processed.is_empty() {
        true => None,
        false => Some(ResultsSnapshot::load(db, event_id).await?),
    };

    let outcomes = processed
        .into_iter()
        .map(|punch| {
            let status = if punch.is_duplicate {
                IngestStatus::Duplicate
            } else {
                IngestStatus::Accepted
            };
            let stage_result = match (&snapshot, status) {
                (Some(snapshot), IngestStatus::Accepted) => consequence_in(snapshot, &punch),
                _ => None,
            };
            IngestOutcome {
                punch,
                status,
                stage_result,
            }
        })
        .collect();

    Ok(outcomes)
}

async fn load_event(conn: &mut SqliteConnection, event_id: i64) -> Result<Event> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT event_id, name, event_date, location, format, time_precision, status, created_at
        FROM events WHERE event_id = ?
        "#,
    )
    .bind(event_id)
    .fetch_optional(conn)
    .await?
    .ok_or(StorageError::NotFound)
}

async fn ensure_control(conn: &mut SqliteConnection, event_id: i64, code: i64) -> Result<()> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM controls WHERE event_id = ? AND code = ?",
    )
    .bind(event_id)
    .bind(code)
    .fetch_one(conn)
    .await?;

    if found == 0 {
        return Err(StorageError::validation(
            "control_code",
            format!("no control with code {code} in this event"),
        ));
    }
    Ok(())
}

async fn stage_consequence(db: &Database, punch: &Punch) -> Result<Option<StageResult>> {
    let snapshot = ResultsSnapshot::load(db, punch.event_id).await?;
    Ok(consequence_in(&snapshot, punch))
}

/// The entrant's result on the stage a punch affects: the first stage by
/// number finishing at the punch's control, else the first starting there.
/// Only stages on the entrant's course are considered.
pub(crate) fn consequence_in(snapshot: &ResultsSnapshot, punch: &Punch) -> Option<StageResult> {
    let bib = *snapshot.bib_by_siac().get(punch.siac.as_str())?;
    let entry = snapshot.entries.iter().find(|e| e.bib == bib)?;
    let class = snapshot.class(entry.class_id)?;
    let course_stages = snapshot.course_stage_ids(class.course_id);

    let on_course = || {
        snapshot
            .stages
            .iter()
            .filter(|stage| course_stages.contains(&stage.stage_id))
    };

    let stage = on_course()
        .find(|s| snapshot.control_code(s.finish_control_id) == Some(punch.control_code))
        .or_else(|| {
            on_course().find(|s| snapshot.control_code(s.start_control_id) == Some(punch.control_code))
        })?;

    compute_stage_results(snapshot, stage.stage_id, Some(entry.class_id))
        .ok()?
        .into_iter()
        .find(|row| row.entry_id == entry.entry_id)
}
