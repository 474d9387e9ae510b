use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::dto::punch::PunchFilter;
use crate::error::{Result, StorageError};
use crate::models::{Punch, PunchSource};

const PUNCH_COLUMNS: &str = "punch_id, event_id, siac, control_code, punch_time, source, \
     is_duplicate, processed, received_at";

/// Repository for the append-only timing log.
///
/// Writes that take part in duplicate classification go through the
/// connection-level helpers so they can run inside the ingest transaction.
pub struct PunchRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PunchRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64, filter: &PunchFilter) -> Result<Vec<Punch>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PUNCH_COLUMNS} FROM punches WHERE event_id = "
        ));
        query.push_bind(event_id);

        if let Some(source) = filter.source {
            query.push(" AND source = ");
            query.push_bind(source.as_str());
        }

        if let Some(duplicate) = filter.duplicate {
            query.push(" AND is_duplicate = ");
            query.push_bind(duplicate);
        }

        if let Some(processed) = filter.processed {
            query.push(" AND processed = ");
            query.push_bind(processed);
        }

        query.push(" ORDER BY punch_id DESC LIMIT ");
        query.push_bind(filter.limit);

        let punches = query.build_query_as::<Punch>().fetch_all(self.pool).await?;
        Ok(punches)
    }

    pub async fn find_by_id(&self, event_id: i64, id: i64) -> Result<Punch> {
        sqlx::query_as::<_, Punch>(&format!(
            "SELECT {PUNCH_COLUMNS} FROM punches WHERE event_id = ? AND punch_id = ?"
        ))
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Administrative removal of a punch; returns the removed row for auditing
    pub async fn delete(&self, event_id: i64, id: i64) -> Result<Punch> {
        sqlx::query_as::<_, Punch>(&format!(
            "DELETE FROM punches WHERE event_id = ? AND punch_id = ? RETURNING {PUNCH_COLUMNS}"
        ))
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn count_deferred(&self, event_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM punches WHERE event_id = ? AND processed = 0",
        )
        .bind(event_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Punches that take part in results, in chronological order
    pub async fn counting(conn: &mut SqliteConnection, event_id: i64) -> Result<Vec<Punch>> {
        let punches = sqlx::query_as::<_, Punch>(&format!(
            r#"
            SELECT {PUNCH_COLUMNS} FROM punches
            WHERE event_id = ? AND processed = 1 AND is_duplicate = 0
            ORDER BY punch_time, punch_id
            "#
        ))
        .bind(event_id)
        .fetch_all(conn)
        .await?;

        Ok(punches)
    }

    /// Times of the processed originals for one transponder at one control
    pub async fn original_times(
        conn: &mut SqliteConnection,
        event_id: i64,
        siac: &str,
        control_code: i64,
    ) -> Result<Vec<NaiveDateTime>> {
        let times = sqlx::query_scalar::<_, NaiveDateTime>(
            r#"
            SELECT punch_time FROM punches
            WHERE event_id = ? AND siac = ? AND control_code = ?
              AND processed = 1 AND is_duplicate = 0
            "#,
        )
        .bind(event_id)
        .bind(siac)
        .bind(control_code)
        .fetch_all(conn)
        .await?;

        Ok(times)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        conn: &mut SqliteConnection,
        event_id: i64,
        siac: &str,
        control_code: i64,
        punch_time: NaiveDateTime,
        source: PunchSource,
        is_duplicate: bool,
        processed: bool,
    ) -> Result<Punch> {
        let punch = sqlx::query_as::<_, Punch>(&format!(
            r#"
            INSERT INTO punches (
                event_id, siac, control_code, punch_time, source, is_duplicate, processed
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {PUNCH_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(siac)
        .bind(control_code)
        .bind(punch_time)
        .bind(source.as_str())
        .bind(is_duplicate)
        .bind(processed)
        .fetch_one(conn)
        .await?;

        Ok(punch)
    }

    /// Deferred punches in submission order
    pub async fn deferred(conn: &mut SqliteConnection, event_id: i64) -> Result<Vec<Punch>> {
        let punches = sqlx::query_as::<_, Punch>(&format!(
            "SELECT {PUNCH_COLUMNS} FROM punches WHERE event_id = ? AND processed = 0 ORDER BY punch_id"
        ))
        .bind(event_id)
        .fetch_all(conn)
        .await?;

        Ok(punches)
    }

    pub async fn mark_processed(
        conn: &mut SqliteConnection,
        punch_id: i64,
        is_duplicate: bool,
    ) -> Result<Punch> {
        let punch = sqlx::query_as::<_, Punch>(&format!(
            r#"
            UPDATE punches SET processed = 1, is_duplicate = ?
            WHERE punch_id = ?
            RETURNING {PUNCH_COLUMNS}
            "#
        ))
        .bind(is_duplicate)
        .bind(punch_id)
        .fetch_one(conn)
        .await?;

        Ok(punch)
    }
}
