use sqlx::SqlitePool;

use crate::dto::class::{CreateClassRequest, UpdateClassRequest};
use crate::error::{Result, StorageError, unique_conflict};
use crate::models::Class;

/// Repository for Class database operations
pub struct ClassRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClassRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64) -> Result<Vec<Class>> {
        let classes = sqlx::query_as::<_, Class>(
            "SELECT class_id, event_id, name, course_id FROM classes WHERE event_id = ? ORDER BY name",
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(classes)
    }

    pub async fn find_by_id(&self, event_id: i64, id: i64) -> Result<Class> {
        sqlx::query_as::<_, Class>(
            "SELECT class_id, event_id, name, course_id FROM classes WHERE event_id = ? AND class_id = ?",
        )
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_name(&self, event_id: i64, name: &str) -> Result<Option<Class>> {
        let class = sqlx::query_as::<_, Class>(
            "SELECT class_id, event_id, name, course_id FROM classes WHERE event_id = ? AND name = ?",
        )
        .bind(event_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(class)
    }

    pub async fn create(&self, event_id: i64, req: &CreateClassRequest) -> Result<Class> {
        self.ensure_course(event_id, req.course_id).await?;

        sqlx::query_as::<_, Class>(
            r#"
            INSERT INTO classes (event_id, name, course_id)
            VALUES (?, ?, ?)
            RETURNING class_id, event_id, name, course_id
            "#,
        )
        .bind(event_id)
        .bind(&req.name)
        .bind(req.course_id)
        .fetch_one(self.pool)
        .await
        .map_err(unique_conflict("Class name already exists for this event"))
    }

    pub async fn update(&self, existing: &Class, req: &UpdateClassRequest) -> Result<Class> {
        let course_id = req.course_id.unwrap_or(existing.course_id);
        self.ensure_course(existing.event_id, course_id).await?;

        sqlx::query_as::<_, Class>(
            r#"
            UPDATE classes SET name = ?, course_id = ?
            WHERE class_id = ?
            RETURNING class_id, event_id, name, course_id
            "#,
        )
        .bind(req.name.as_ref().unwrap_or(&existing.name))
        .bind(course_id)
        .bind(existing.class_id)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_conflict("Class name already exists for this event"))?
        .ok_or(StorageError::NotFound)
    }

    pub async fn delete(&self, event_id: i64, id: i64) -> Result<()> {
        let entries = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entries WHERE class_id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        if entries > 0 {
            return Err(StorageError::Referential(format!(
                "Class {id} still has {entries} entr(y/ies)"
            )));
        }

        let result = sqlx::query("DELETE FROM classes WHERE event_id = ? AND class_id = ?")
            .bind(event_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn ensure_course(&self, event_id: i64, course_id: i64) -> Result<()> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses WHERE event_id = ? AND course_id = ?",
        )
        .bind(event_id)
        .bind(course_id)
        .fetch_one(self.pool)
        .await?;

        if exists == 0 {
            return Err(StorageError::validation(
                "course_id",
                format!("course {course_id} does not exist in this event"),
            ));
        }

        Ok(())
    }
}
