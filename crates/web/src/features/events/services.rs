use storage::{
    Database,
    dto::audit::NewAuditEntry,
    dto::event::{CreateEventRequest, UpdateEventRequest},
    error::Result,
    models::Event,
    repository::event::EventRepository,
};

use crate::features::audit::services as audit;

pub async fn list_events(db: &Database) -> Result<Vec<Event>> {
    EventRepository::new(db.pool()).list().await
}

pub async fn get_event(db: &Database, event_id: i64) -> Result<Event> {
    EventRepository::new(db.pool()).find_by_id(event_id).await
}

pub async fn create_event(db: &Database, req: &CreateEventRequest) -> Result<Event> {
    let event = EventRepository::new(db.pool()).create(req).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event.event_id), "event.create", "event")
            .entity(event.event_id)
            .details(req),
    )
    .await?;

    Ok(event)
}

pub async fn update_event(db: &Database, event_id: i64, req: &UpdateEventRequest) -> Result<Event> {
    let repo = EventRepository::new(db.pool());
    let existing = repo.find_by_id(event_id).await?;
    let event = repo.update(&existing, req).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "event.update", "event")
            .entity(event_id)
            .details(req),
    )
    .await?;

    Ok(event)
}

/// Deletes the event and everything scoped to it
pub async fn delete_event(db: &Database, event_id: i64) -> Result<()> {
    let repo = EventRepository::new(db.pool());
    let existing = repo.find_by_id(event_id).await?;
    repo.delete(event_id).await?;

    audit::record(
        db,
        NewAuditEntry::new(None, "event.delete", "event")
            .entity(event_id)
            .details(&existing),
    )
    .await
}
