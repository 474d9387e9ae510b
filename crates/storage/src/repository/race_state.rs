use chrono::NaiveDateTime;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::models::RaceState;

/// Repository for the per-event race-day gates
pub struct RaceStateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RaceStateRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, event_id: i64) -> Result<RaceState> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, event_id).await
    }

    /// Gates of an event; an event without a row has both gates open
    pub async fn get_in(conn: &mut SqliteConnection, event_id: i64) -> Result<RaceState> {
        let state = sqlx::query_as::<_, RaceState>(
            r#"
            SELECT event_id, ingest_paused, standings_frozen, frozen_at, frozen_snapshot
            FROM race_state
            WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(conn)
        .await?;

        Ok(state.unwrap_or(RaceState {
            event_id,
            ..RaceState::default()
        }))
    }

    pub async fn set_paused(conn: &mut SqliteConnection, event_id: i64, paused: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO race_state (event_id, ingest_paused) VALUES (?, ?)
            ON CONFLICT (event_id) DO UPDATE SET ingest_paused = excluded.ingest_paused
            "#,
        )
        .bind(event_id)
        .bind(paused)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn set_frozen(
        &self,
        event_id: i64,
        frozen_at: Option<NaiveDateTime>,
        snapshot: Option<String>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO race_state (event_id, standings_frozen, frozen_at, frozen_snapshot)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (event_id) DO UPDATE SET
                standings_frozen = excluded.standings_frozen,
                frozen_at = excluded.frozen_at,
                frozen_snapshot = excluded.frozen_snapshot
            "#,
        )
        .bind(event_id)
        .bind(frozen_at.is_some())
        .bind(frozen_at)
        .bind(snapshot)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
