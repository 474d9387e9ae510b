use sqlx::SqlitePool;

use crate::dto::stage::{CreateStageRequest, UpdateStageRequest, check_stage_shape};
use crate::error::{Result, StorageError, unique_conflict};
use crate::models::Stage;

const STAGE_COLUMNS: &str = "stage_id, event_id, stage_number, name, start_control_id, \
     finish_control_id, is_timed, runs_to_count, max_runs";

/// Repository for Stage database operations
pub struct StageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as::<_, Stage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE event_id = ? ORDER BY stage_number"
        ))
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(stages)
    }

    pub async fn find_by_id(&self, event_id: i64, id: i64) -> Result<Stage> {
        sqlx::query_as::<_, Stage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE event_id = ? AND stage_id = ?"
        ))
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn create(&self, event_id: i64, req: &CreateStageRequest) -> Result<Stage> {
        check_stage_shape(
            req.start_control_id,
            req.finish_control_id,
            req.runs_to_count,
            req.max_runs,
        )
        .map_err(|msg| StorageError::validation("finish_control_id", msg))?;

        self.ensure_control(event_id, req.start_control_id, "start_control_id")
            .await?;
        self.ensure_control(event_id, req.finish_control_id, "finish_control_id")
            .await?;

        sqlx::query_as::<_, Stage>(&format!(
            r#"
            INSERT INTO stages (
                event_id, stage_number, name, start_control_id, finish_control_id,
                is_timed, runs_to_count, max_runs
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {STAGE_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(req.stage_number)
        .bind(&req.name)
        .bind(req.start_control_id)
        .bind(req.finish_control_id)
        .bind(req.is_timed)
        .bind(req.runs_to_count)
        .bind(req.max_runs)
        .fetch_one(self.pool)
        .await
        .map_err(unique_conflict("Stage number already exists for this event"))
    }

    pub async fn update(&self, existing: &Stage, req: &UpdateStageRequest) -> Result<Stage> {
        let start = req.start_control_id.unwrap_or(existing.start_control_id);
        let finish = req.finish_control_id.unwrap_or(existing.finish_control_id);
        let runs_to_count = req.runs_to_count.unwrap_or(existing.runs_to_count);
        let max_runs = req.max_runs.unwrap_or(existing.max_runs);

        check_stage_shape(start, finish, runs_to_count, max_runs)
            .map_err(|msg| StorageError::validation("finish_control_id", msg))?;

        self.ensure_control(existing.event_id, start, "start_control_id")
            .await?;
        self.ensure_control(existing.event_id, finish, "finish_control_id")
            .await?;

        sqlx::query_as::<_, Stage>(&format!(
            r#"
            UPDATE stages
            SET stage_number = ?, name = ?, start_control_id = ?, finish_control_id = ?,
                is_timed = ?, runs_to_count = ?, max_runs = ?
            WHERE stage_id = ?
            RETURNING {STAGE_COLUMNS}
            "#
        ))
        .bind(req.stage_number.unwrap_or(existing.stage_number))
        .bind(req.name.as_ref().unwrap_or(&existing.name))
        .bind(start)
        .bind(finish)
        .bind(req.is_timed.unwrap_or(existing.is_timed))
        .bind(runs_to_count)
        .bind(max_runs)
        .bind(existing.stage_id)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_conflict("Stage number already exists for this event"))?
        .ok_or(StorageError::NotFound)
    }

    pub async fn delete(&self, event_id: i64, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM stages WHERE event_id = ? AND stage_id = ?")
            .bind(event_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn ensure_control(&self, event_id: i64, control_id: i64, field: &str) -> Result<()> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM controls WHERE event_id = ? AND control_id = ?",
        )
        .bind(event_id)
        .bind(control_id)
        .fetch_one(self.pool)
        .await?;

        if exists == 0 {
            return Err(StorageError::validation(
                field,
                format!("control {control_id} does not exist in this event"),
            ));
        }

        Ok(())
    }
}
