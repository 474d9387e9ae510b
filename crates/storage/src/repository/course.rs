use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};

use crate::dto::course::{CourseResponse, CreateCourseRequest, UpdateCourseRequest};
use crate::error::{Result, StorageError};
use crate::models::{Course, CourseStage};

const COURSE_COLUMNS: &str = "course_id, event_id, name, laps, stages_any_order, allow_repeat";

/// Repository for Course database operations, including ordered stage
/// membership.
pub struct CourseRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CourseRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64) -> Result<Vec<CourseResponse>> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE event_id = ? ORDER BY name, course_id"
        ))
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        let mut memberships = self.memberships(event_id).await?;

        Ok(courses
            .into_iter()
            .map(|course| {
                let stage_ids = memberships.remove(&course.course_id).unwrap_or_default();
                CourseResponse { course, stage_ids }
            })
            .collect())
    }

    pub async fn find_by_id(&self, event_id: i64, id: i64) -> Result<CourseResponse> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE event_id = ? AND course_id = ?"
        ))
        .bind(event_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        let stage_ids = sqlx::query_scalar::<_, i64>(
            "SELECT stage_id FROM course_stages WHERE course_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(CourseResponse { course, stage_ids })
    }

    /// Ordered stage ids of every course in the event, keyed by course
    pub async fn memberships(&self, event_id: i64) -> Result<HashMap<i64, Vec<i64>>> {
        let rows = sqlx::query_as::<_, CourseStage>(
            r#"
            SELECT cs.course_id, cs.stage_id, cs.position
            FROM course_stages cs
            INNER JOIN courses c ON c.course_id = cs.course_id
            WHERE c.event_id = ?
            ORDER BY cs.course_id, cs.position
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            map.entry(row.course_id).or_default().push(row.stage_id);
        }
        Ok(map)
    }

    pub async fn create(&self, event_id: i64, req: &CreateCourseRequest) -> Result<CourseResponse> {
        let mut tx = self.pool.begin().await?;

        let course = sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (event_id, name, laps, stages_any_order, allow_repeat)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(&req.name)
        .bind(req.laps)
        .bind(req.stages_any_order)
        .bind(req.allow_repeat)
        .fetch_one(&mut *tx)
        .await?;

        replace_stages(&mut tx, event_id, course.course_id, &req.stage_ids).await?;
        tx.commit().await?;

        Ok(CourseResponse {
            course,
            stage_ids: req.stage_ids.clone(),
        })
    }

    pub async fn update(&self, existing: &Course, req: &UpdateCourseRequest) -> Result<Course> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses
            SET name = ?, laps = ?, stages_any_order = ?, allow_repeat = ?
            WHERE course_id = ?
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(req.name.as_ref().unwrap_or(&existing.name))
        .bind(req.laps.unwrap_or(existing.laps))
        .bind(req.stages_any_order.unwrap_or(existing.stages_any_order))
        .bind(req.allow_repeat.unwrap_or(existing.allow_repeat))
        .bind(existing.course_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Replace the ordered stage membership of a course
    pub async fn set_stages(&self, event_id: i64, course_id: i64, stage_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        replace_stages(&mut tx, event_id, course_id, stage_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(&self, event_id: i64, id: i64) -> Result<()> {
        let classes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes WHERE course_id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        if classes > 0 {
            return Err(StorageError::Referential(format!(
                "Course {id} is used by {classes} class(es)"
            )));
        }

        let result = sqlx::query("DELETE FROM courses WHERE event_id = ? AND course_id = ?")
            .bind(event_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

async fn replace_stages(
    conn: &mut SqliteConnection,
    event_id: i64,
    course_id: i64,
    stage_ids: &[i64],
) -> Result<()> {
    for stage_id in stage_ids {
        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stages WHERE event_id = ? AND stage_id = ?",
        )
        .bind(event_id)
        .bind(stage_id)
        .fetch_one(&mut *conn)
        .await?;

        if known == 0 {
            return Err(StorageError::validation(
                "stage_ids",
                format!("stage {stage_id} does not exist in this event"),
            ));
        }
    }

    sqlx::query("DELETE FROM course_stages WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    for (position, stage_id) in stage_ids.iter().enumerate() {
        sqlx::query("INSERT INTO course_stages (course_id, stage_id, position) VALUES (?, ?, ?)")
            .bind(course_id)
            .bind(stage_id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
