use sqlx::SqlitePool;

use crate::dto::entry::{CreateEntryRequest, UpdateEntryRequest};
use crate::error::{Result, StorageError, unique_conflict};
use crate::models::Entry;

const ENTRY_COLUMNS: &str = "entry_id, event_id, bib, first_name, last_name, club, class_id";

/// Repository for Entry database operations
pub struct EntryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EntryRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64, class_id: Option<i64>) -> Result<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM entries
            WHERE event_id = ? AND (? IS NULL OR class_id = ?)
            ORDER BY bib
            "#
        ))
        .bind(event_id)
        .bind(class_id)
        .bind(class_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn find_by_id(&self, event_id: i64, id: i64) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE event_id = ? AND entry_id = ?"
        ))
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_bib(&self, event_id: i64, bib: i64) -> Result<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE event_id = ? AND bib = ?"
        ))
        .bind(event_id)
        .bind(bib)
        .fetch_optional(self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn create(&self, event_id: i64, req: &CreateEntryRequest) -> Result<Entry> {
        self.ensure_class(event_id, req.class_id).await?;

        sqlx::query_as::<_, Entry>(&format!(
            r#"
            INSERT INTO entries (event_id, bib, first_name, last_name, club, class_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(req.bib)
        .bind(req.first_name.trim())
        .bind(req.last_name.trim())
        .bind(&req.club)
        .bind(req.class_id)
        .fetch_one(self.pool)
        .await
        .map_err(unique_conflict("Bib already exists for this event"))
    }

    /// Insert or, when the bib is already registered, overwrite the entry
    pub async fn upsert(&self, event_id: i64, req: &CreateEntryRequest) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(&format!(
            r#"
            INSERT INTO entries (event_id, bib, first_name, last_name, club, class_id)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (event_id, bib) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                club = excluded.club,
                class_id = excluded.class_id
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(req.bib)
        .bind(req.first_name.trim())
        .bind(req.last_name.trim())
        .bind(&req.club)
        .bind(req.class_id)
        .fetch_one(self.pool)
        .await
        .map_err(StorageError::from)
    }

    pub async fn update(&self, existing: &Entry, req: &UpdateEntryRequest) -> Result<Entry> {
        let class_id = req.class_id.unwrap_or(existing.class_id);
        self.ensure_class(existing.event_id, class_id).await?;

        sqlx::query_as::<_, Entry>(&format!(
            r#"
            UPDATE entries
            SET bib = ?, first_name = ?, last_name = ?, club = ?, class_id = ?
            WHERE entry_id = ?
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(req.bib.unwrap_or(existing.bib))
        .bind(req.first_name.as_ref().unwrap_or(&existing.first_name))
        .bind(req.last_name.as_ref().unwrap_or(&existing.last_name))
        .bind(req.club.as_ref().or(existing.club.as_ref()))
        .bind(class_id)
        .bind(existing.entry_id)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_conflict("Bib already exists for this event"))?
        .ok_or(StorageError::NotFound)
    }

    /// Delete an entry together with its chips
    pub async fn delete(&self, event_id: i64, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM entries WHERE event_id = ? AND entry_id = ?")
            .bind(event_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn ensure_class(&self, event_id: i64, class_id: i64) -> Result<()> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM classes WHERE event_id = ? AND class_id = ?",
        )
        .bind(event_id)
        .bind(class_id)
        .fetch_one(self.pool)
        .await?;

        if exists == 0 {
            return Err(StorageError::validation(
                "class_id",
                format!("class {class_id} does not exist in this event"),
            ));
        }

        Ok(())
    }
}
