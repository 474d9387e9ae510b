use storage::{
    Database,
    dto::audit::{AuditQuery, NewAuditEntry},
    error::Result,
    models::AuditLogEntry,
    repository::audit::AuditRepository,
};

/// Appends one entry for an administrative change
pub async fn record(db: &Database, entry: NewAuditEntry) -> Result<()> {
    AuditRepository::new(db.pool()).append(&entry).await?;
    Ok(())
}

pub async fn list(db: &Database, query: &AuditQuery) -> Result<Vec<AuditLogEntry>> {
    AuditRepository::new(db.pool()).list(query).await
}
