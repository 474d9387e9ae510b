use sqlx::SqlitePool;

use crate::dto::audit::{AuditQuery, NewAuditEntry};
use crate::error::Result;
use crate::models::AuditLogEntry;

/// Repository for the append-only audit log
pub struct AuditRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry> {
        let entry = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            INSERT INTO audit_log (event_id, action, entity_type, entity_id, details, source)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING audit_id, event_id, created_at, action, entity_type, entity_id, details, source
            "#,
        )
        .bind(entry.event_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .bind(&entry.source)
        .fetch_one(self.pool)
        .await?;

        Ok(entry)
    }

    /// Most recent entries first
    pub async fn list(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT audit_id, event_id, created_at, action, entity_type, entity_id, details, source
            FROM audit_log
            WHERE (? IS NULL OR event_id = ?)
            ORDER BY audit_id DESC
            LIMIT ?
            "#,
        )
        .bind(query.event_id)
        .bind(query.event_id)
        .bind(query.limit)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }
}
