use sqlx::SqlitePool;

use crate::dto::event::{CreateEventRequest, UpdateEventRequest};
use crate::error::{Result, StorageError};
use crate::models::{Event, EventStatus};

const EVENT_COLUMNS: &str =
    "event_id, name, event_date, location, format, time_precision, status, created_at";

/// Repository for Event database operations
pub struct EventRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all events, most recent first
    pub async fn list(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date DESC, event_id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn create(&self, req: &CreateEventRequest) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, event_date, location, format, time_precision, status)
            VALUES (?, ?, ?, ?, ?, 'setup')
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(req.event_date)
        .bind(&req.location)
        .bind(&req.format)
        .bind(req.time_precision.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(event)
    }

    pub async fn update(&self, existing: &Event, req: &UpdateEventRequest) -> Result<Event> {
        let name = req.name.as_ref().unwrap_or(&existing.name);
        let event_date = req.event_date.unwrap_or(existing.event_date);
        let location = req.location.as_ref().or(existing.location.as_ref());
        let format = req.format.as_ref().or(existing.format.as_ref());
        let precision = req.time_precision.unwrap_or(existing.time_precision);

        sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET name = ?, event_date = ?, location = ?, format = ?, time_precision = ?
            WHERE event_id = ?
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(event_date)
        .bind(location)
        .bind(format)
        .bind(precision.as_str())
        .bind(existing.event_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn set_status(&self, id: i64, status: EventStatus) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = ? WHERE event_id = ? RETURNING {EVENT_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Delete an event and, through cascades, everything scoped to it
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE event_id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
