use storage::{
    Database,
    dto::race_state::RaceStateResponse,
    dto::results::RecomputeReport,
    error::Result,
    repository::race_state::RaceStateRepository,
    repository::stage::StageRepository,
    services::RaceControl,
};

use crate::features::punches::services::announce;
use crate::hub::{HighlightPriority, Hub, HubMessage, StageState};

/// Reopens ingest, processes the backlog and announces what it produced.
/// Returns the new state and the number of punches processed.
pub async fn resume_ingest(
    control: &RaceControl<'_>,
    db: &Database,
    hub: &Hub,
    event_id: i64,
) -> Result<(RaceStateResponse, usize)> {
    let outcomes = control.resume_ingest(event_id).await?;
    let processed = outcomes.len();

    announce(db, hub, event_id, outcomes).await?;

    Ok((control.race_state(event_id).await?, processed))
}

pub async fn unfreeze_standings(
    control: &RaceControl<'_>,
    hub: &Hub,
    event_id: i64,
) -> Result<RaceStateResponse> {
    let state = control.unfreeze_standings(event_id).await?;
    hub.broadcast(HubMessage::standings(event_id, "unfreeze"));
    Ok(state)
}

pub async fn recompute(
    control: &RaceControl<'_>,
    db: &Database,
    hub: &Hub,
    event_id: i64,
) -> Result<RecomputeReport> {
    let report = control.recompute(event_id).await?;

    let frozen = RaceStateRepository::new(db.pool())
        .get(event_id)
        .await?
        .standings_frozen;
    if !frozen {
        hub.broadcast(HubMessage::standings(event_id, "recompute"));
    }

    Ok(report)
}

/// Sends a speaker note; returns the number of displays it reached
pub fn post_highlight(hub: &Hub, event_id: i64, text: String, priority: HighlightPriority) -> usize {
    hub.broadcast(HubMessage::Highlight {
        event_id,
        text,
        priority,
    })
}

pub async fn post_stage_status(
    db: &Database,
    hub: &Hub,
    event_id: i64,
    stage_id: i64,
    status: StageState,
) -> Result<usize> {
    StageRepository::new(db.pool()).find_by_id(event_id, stage_id).await?;

    let message = HubMessage::StageStatus {
        event_id,
        stage_id,
        status,
    };
    tracing::info!(event_id, stage_id, ?status, "Stage status posted");

    Ok(hub.broadcast(message))
}
