use std::collections::HashMap;

use crate::Database;
use crate::error::{Result, StorageError};
use crate::models::{Chip, Class, Control, Course, CourseStage, Entry, Event, Punch, Stage};
use crate::repository::punch::PunchRepository;

/// Everything result computation reads, loaded inside one read transaction
/// so a computation never observes a half-written punch batch.
#[derive(Debug, Clone)]
pub struct ResultsSnapshot {
    pub event: Event,
    pub controls: Vec<Control>,
    pub stages: Vec<Stage>,
    pub courses: Vec<Course>,
    pub memberships: HashMap<i64, Vec<i64>>,
    pub classes: Vec<Class>,
    pub entries: Vec<Entry>,
    pub chips: Vec<Chip>,
    /// Processed, non-duplicate punches in chronological order.
    pub punches: Vec<Punch>,
}

impl ResultsSnapshot {
    pub async fn load(db: &Database, event_id: i64) -> Result<Self> {
        let mut tx = db.pool().begin().await?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, name, event_date, location, format, time_precision, status, created_at
            FROM events WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        let controls = sqlx::query_as::<_, Control>(
            "SELECT control_id, event_id, code, name, control_type FROM controls WHERE event_id = ?",
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let stages = sqlx::query_as::<_, Stage>(
            r#"
            SELECT stage_id, event_id, stage_number, name, start_control_id, finish_control_id,
                   is_timed, runs_to_count, max_runs
            FROM stages WHERE event_id = ?
            ORDER BY stage_number
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, event_id, name, laps, stages_any_order, allow_repeat
            FROM courses WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let course_stages = sqlx::query_as::<_, CourseStage>(
            r#"
            SELECT cs.course_id, cs.stage_id, cs.position
            FROM course_stages cs
            INNER JOIN courses c ON c.course_id = cs.course_id
            WHERE c.event_id = ?
            ORDER BY cs.course_id, cs.position
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut memberships: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in course_stages {
            memberships.entry(row.course_id).or_default().push(row.stage_id);
        }

        let classes = sqlx::query_as::<_, Class>(
            "SELECT class_id, event_id, name, course_id FROM classes WHERE event_id = ?",
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT entry_id, event_id, bib, first_name, last_name, club, class_id
            FROM entries WHERE event_id = ?
            ORDER BY bib
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let chips = sqlx::query_as::<_, Chip>(
            "SELECT chip_id, event_id, bib, siac, is_primary FROM chips WHERE event_id = ?",
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?;

        let punches = PunchRepository::counting(&mut tx, event_id).await?;

        tx.commit().await?;

        Ok(Self {
            event,
            controls,
            stages,
            courses,
            memberships,
            classes,
            entries,
            chips,
            punches,
        })
    }

    pub fn control_code(&self, control_id: i64) -> Option<i64> {
        self.controls
            .iter()
            .find(|c| c.control_id == control_id)
            .map(|c| c.code)
    }

    pub fn stage(&self, stage_id: i64) -> Option<&Stage> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    pub fn class(&self, class_id: i64) -> Option<&Class> {
        self.classes.iter().find(|c| c.class_id == class_id)
    }

    pub fn course(&self, course_id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.course_id == course_id)
    }

    /// Ordered stage ids of a course, repeated stages included
    pub fn course_stage_ids(&self, course_id: i64) -> &[i64] {
        self.memberships
            .get(&course_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Transponder to bib. A primary chip wins over older assignments, then
    /// the most recently registered chip.
    pub fn bib_by_siac(&self) -> HashMap<&str, i64> {
        let mut chips: Vec<&Chip> = self.chips.iter().collect();
        chips.sort_by_key(|c| (c.is_primary, c.chip_id));

        chips
            .into_iter()
            .map(|c| (c.siac.as_str(), c.bib))
            .collect()
    }

    /// Counting punches grouped by bib, each list chronological
    pub fn punches_by_bib(&self) -> HashMap<i64, Vec<&Punch>> {
        let bibs = self.bib_by_siac();
        let mut grouped: HashMap<i64, Vec<&Punch>> = HashMap::new();

        for punch in &self.punches {
            if let Some(bib) = bibs.get(punch.siac.as_str()) {
                grouped.entry(*bib).or_default().push(punch);
            }
        }

        grouped
    }

    /// Entries whose class course includes the stage
    pub fn entries_for_stage(&self, stage_id: i64) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(move |entry| {
            self.class(entry.class_id)
                .map(|class| self.course_stage_ids(class.course_id).contains(&stage_id))
                .unwrap_or(false)
        })
    }
}
