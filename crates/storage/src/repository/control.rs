use sqlx::SqlitePool;

use crate::dto::control::{CreateControlRequest, UpdateControlRequest};
use crate::error::{Result, StorageError, unique_conflict};
use crate::models::Control;

/// Repository for Control database operations
pub struct ControlRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ControlRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64) -> Result<Vec<Control>> {
        let controls = sqlx::query_as::<_, Control>(
            r#"
            SELECT control_id, event_id, code, name, control_type
            FROM controls
            WHERE event_id = ?
            ORDER BY code
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(controls)
    }

    pub async fn find_by_id(&self, event_id: i64, id: i64) -> Result<Control> {
        sqlx::query_as::<_, Control>(
            r#"
            SELECT control_id, event_id, code, name, control_type
            FROM controls
            WHERE event_id = ? AND control_id = ?
            "#,
        )
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_code(&self, event_id: i64, code: i64) -> Result<Option<Control>> {
        let control = sqlx::query_as::<_, Control>(
            r#"
            SELECT control_id, event_id, code, name, control_type
            FROM controls
            WHERE event_id = ? AND code = ?
            "#,
        )
        .bind(event_id)
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(control)
    }

    pub async fn create(&self, event_id: i64, req: &CreateControlRequest) -> Result<Control> {
        sqlx::query_as::<_, Control>(
            r#"
            INSERT INTO controls (event_id, code, name, control_type)
            VALUES (?, ?, ?, ?)
            RETURNING control_id, event_id, code, name, control_type
            "#,
        )
        .bind(event_id)
        .bind(req.code)
        .bind(&req.name)
        .bind(req.control_type.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(unique_conflict("Control code already exists for this event"))
    }

    pub async fn update(&self, existing: &Control, req: &UpdateControlRequest) -> Result<Control> {
        sqlx::query_as::<_, Control>(
            r#"
            UPDATE controls
            SET code = ?, name = ?, control_type = ?
            WHERE control_id = ?
            RETURNING control_id, event_id, code, name, control_type
            "#,
        )
        .bind(req.code.unwrap_or(existing.code))
        .bind(req.name.as_ref().unwrap_or(&existing.name))
        .bind(req.control_type.unwrap_or(existing.control_type).as_str())
        .bind(existing.control_id)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_conflict("Control code already exists for this event"))?
        .ok_or(StorageError::NotFound)
    }

    /// Number of stages that start or finish at the control
    pub async fn count_stage_references(&self, control_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM stages
            WHERE start_control_id = ? OR finish_control_id = ?
            "#,
        )
        .bind(control_id)
        .bind(control_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Delete a control. Refused while any stage references it.
    pub async fn delete(&self, event_id: i64, id: i64) -> Result<()> {
        let control = self.find_by_id(event_id, id).await?;

        let references = self.count_stage_references(control.control_id).await?;
        if references > 0 {
            return Err(StorageError::Referential(format!(
                "Control {} is used by {} stage(s)",
                control.code, references
            )));
        }

        sqlx::query("DELETE FROM controls WHERE control_id = ?")
            .bind(control.control_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    #[tokio::test]
    async fn test_control_used_by_stage_cannot_be_deleted() {
        let fx = Fixture::single_stage(1, None).await;
        let controls = ControlRepository::new(fx.db.pool());
        let start = controls.find_by_code(fx.event_id, 31).await.unwrap().unwrap();

        let err = controls.delete(fx.event_id, start.control_id).await.unwrap_err();
        assert!(matches!(err, StorageError::Referential(_)));
        assert!(controls.find_by_code(fx.event_id, 31).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_a_conflict() {
        let fx = Fixture::single_stage(1, None).await;
        let err = ControlRepository::new(fx.db.pool())
            .create(
                fx.event_id,
                &CreateControlRequest {
                    code: 31,
                    name: "Second start".to_string(),
                    control_type: crate::models::ControlType::Start,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
    }
}
