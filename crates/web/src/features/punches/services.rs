use storage::{
    Database,
    dto::audit::NewAuditEntry,
    dto::punch::{IngestOutcome, IngestStatus, NewPunch, PunchFilter},
    error::Result,
    models::Punch,
    repository::event::EventRepository,
    repository::punch::PunchRepository,
    repository::race_state::RaceStateRepository,
    services::{IngestSettings, record_punch},
};

use crate::features::audit::services as audit;
use crate::hub::{Hub, HubMessage};

pub async fn list_punches(db: &Database, event_id: i64, filter: &PunchFilter) -> Result<Vec<Punch>> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;
    PunchRepository::new(db.pool()).list(event_id, filter).await
}

pub async fn get_punch(db: &Database, event_id: i64, punch_id: i64) -> Result<Punch> {
    PunchRepository::new(db.pool()).find_by_id(event_id, punch_id).await
}

/// Records a punch and notifies subscribers of the outcome
pub async fn create_punch(
    db: &Database,
    hub: &Hub,
    settings: IngestSettings,
    event_id: i64,
    punch: NewPunch,
) -> Result<IngestOutcome> {
    let outcome = record_punch(db, settings, event_id, punch).await?;
    announce(db, hub, event_id, vec![outcome.clone()]).await?;
    Ok(outcome)
}

pub async fn delete_punch(db: &Database, hub: &Hub, event_id: i64, punch_id: i64) -> Result<Punch> {
    let punch = PunchRepository::new(db.pool()).delete(event_id, punch_id).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "punch.delete", "punch")
            .entity(punch_id)
            .details(&punch),
    )
    .await?;
    tracing::info!(event_id, punch_id, siac = %punch.siac, "Punch deleted");

    if !standings_frozen(db, event_id).await? {
        hub.broadcast(HubMessage::standings(event_id, "punch.delete"));
    }

    Ok(punch)
}

/// Broadcasts accepted punches and, unless standings are frozen, a
/// standings refresh. Duplicates and deferred punches change no result and
/// are not announced.
pub async fn announce(db: &Database, hub: &Hub, event_id: i64, outcomes: Vec<IngestOutcome>) -> Result<()> {
    let accepted: Vec<IngestOutcome> = outcomes
        .into_iter()
        .filter(|outcome| outcome.status == IngestStatus::Accepted)
        .collect();

    if accepted.is_empty() {
        return Ok(());
    }

    let frozen = standings_frozen(db, event_id).await?;
    for outcome in accepted {
        hub.broadcast(HubMessage::punch(outcome, frozen));
    }

    if !frozen {
        hub.broadcast(HubMessage::standings(event_id, "punch"));
    }

    Ok(())
}

async fn standings_frozen(db: &Database, event_id: i64) -> Result<bool> {
    Ok(RaceStateRepository::new(db.pool())
        .get(event_id)
        .await?
        .standings_frozen)
}
