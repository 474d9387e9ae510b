use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqliteConnection;

use crate::Database;
use crate::dto::audit::NewAuditEntry;
use crate::dto::backup::{BackupDescriptor, EntityCounts, RestoreRequest};
use crate::error::{Result, StorageError};
use crate::models::{
    AuditLogEntry, Chip, Class, Control, Course, CourseStage, Entry, Event, Punch, RaceState, Stage,
};
use crate::repository::audit::AuditRepository;

const FORMAT_VERSION: u32 = 1;

/// Full durable state as written to a backup file.
#[derive(Debug, Serialize, Deserialize)]
struct BackupFile {
    version: u32,
    label: String,
    created_at: NaiveDateTime,
    events: Vec<Event>,
    controls: Vec<Control>,
    stages: Vec<Stage>,
    courses: Vec<Course>,
    course_stages: Vec<CourseStage>,
    classes: Vec<Class>,
    entries: Vec<Entry>,
    chips: Vec<Chip>,
    punches: Vec<Punch>,
    race_states: Vec<RaceState>,
    audit_log: Vec<AuditLogEntry>,
}

impl BackupFile {
    fn counts(&self) -> EntityCounts {
        EntityCounts {
            events: self.events.len(),
            controls: self.controls.len(),
            stages: self.stages.len(),
            courses: self.courses.len(),
            course_stages: self.course_stages.len(),
            classes: self.classes.len(),
            entries: self.entries.len(),
            chips: self.chips.len(),
            punches: self.punches.len(),
            race_states: self.race_states.len(),
            audit_entries: self.audit_log.len(),
        }
    }

    fn descriptor(&self, filename: String) -> BackupDescriptor {
        BackupDescriptor {
            filename,
            label: self.label.clone(),
            created_at: self.created_at,
            counts: self.counts(),
        }
    }
}

/// JSON snapshots of the whole database in a backup directory.
pub struct BackupService<'a> {
    db: &'a Database,
    dir: PathBuf,
}

impl<'a> BackupService<'a> {
    pub fn new(db: &'a Database, dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            dir: dir.into(),
        }
    }

    pub async fn create(&self, label: &str) -> Result<BackupDescriptor> {
        let created_at = Utc::now().naive_utc();

        let mut tx = self.db.pool().begin().await?;
        let file = capture(&mut tx, label, created_at).await?;
        tx.commit().await?;

        let filename = format!("{}_{}.json", created_at.format("%Y%m%dT%H%M%S%3f"), slug(label));
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), serde_json::to_vec_pretty(&file)?).await?;

        let descriptor = file.descriptor(filename);
        self.audit("backup.create", &descriptor).await?;
        tracing::info!(filename = %descriptor.filename, label, "Backup written");

        Ok(descriptor)
    }

    /// Backups in the directory, newest first. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<BackupDescriptor>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match read_backup(&path).await {
                Ok(file) => {
                    let filename = item.file_name().to_string_lossy().into_owned();
                    backups.push(file.descriptor(filename));
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable backup"),
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.filename.cmp(&a.filename)));
        Ok(backups)
    }

    /// Replaces all current state with a backup.
    ///
    /// Refused without `confirm`. The file is parsed completely before
    /// anything is touched and applied in one transaction, so a failed
    /// restore leaves the prior state intact.
    pub async fn restore(&self, req: &RestoreRequest) -> Result<EntityCounts> {
        if !req.confirm {
            return Err(StorageError::ConfirmationRequired);
        }

        let path = self.resolve(&req.filename)?;
        let file = match read_backup(&path).await {
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound);
            }
            other => other?,
        };

        if file.version != FORMAT_VERSION {
            return Err(StorageError::Backup(format!(
                "unsupported backup version {}",
                file.version
            )));
        }

        {
            let _guard = self.db.lock_ingest().await;
            let mut tx = self.db.pool().begin().await?;
            clear(&mut tx).await?;
            apply(&mut tx, &file).await?;
            tx.commit().await?;
        }

        let counts = file.counts();
        self.audit(
            "backup.restore",
            &json!({ "filename": req.filename, "label": file.label, "counts": counts }),
        )
        .await?;
        tracing::warn!(filename = %req.filename, "State restored from backup");

        Ok(counts)
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let plain = Path::new(filename)
            .file_name()
            .is_some_and(|name| name == filename);

        if !plain || !filename.ends_with(".json") {
            return Err(StorageError::validation(
                "filename",
                "must be the name of a backup file in the backup directory",
            ));
        }
        Ok(self.dir.join(filename))
    }

    async fn audit<T: Serialize>(&self, action: &str, details: &T) -> Result<()> {
        AuditRepository::new(self.db.pool())
            .append(&NewAuditEntry::new(None, action, "backup").details(details))
            .await?;
        Ok(())
    }
}

async fn read_backup(path: &Path) -> Result<BackupFile> {
    let raw = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

fn slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "backup".to_string()
    } else {
        slug.to_string()
    }
}

async fn capture(conn: &mut SqliteConnection, label: &str, created_at: NaiveDateTime) -> Result<BackupFile> {
    Ok(BackupFile {
        version: FORMAT_VERSION,
        label: label.to_string(),
        created_at,
        events: sqlx::query_as(
            "SELECT event_id, name, event_date, location, format, time_precision, status, created_at \
             FROM events ORDER BY event_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        controls: sqlx::query_as(
            "SELECT control_id, event_id, code, name, control_type FROM controls ORDER BY control_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        stages: sqlx::query_as(
            "SELECT stage_id, event_id, stage_number, name, start_control_id, finish_control_id, \
             is_timed, runs_to_count, max_runs FROM stages ORDER BY stage_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        courses: sqlx::query_as(
            "SELECT course_id, event_id, name, laps, stages_any_order, allow_repeat \
             FROM courses ORDER BY course_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        course_stages: sqlx::query_as(
            "SELECT course_id, stage_id, position FROM course_stages ORDER BY course_id, position",
        )
        .fetch_all(&mut *conn)
        .await?,
        classes: sqlx::query_as("SELECT class_id, event_id, name, course_id FROM classes ORDER BY class_id")
            .fetch_all(&mut *conn)
            .await?,
        entries: sqlx::query_as(
            "SELECT entry_id, event_id, bib, first_name, last_name, club, class_id \
             FROM entries ORDER BY entry_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        chips: sqlx::query_as("SELECT chip_id, event_id, bib, siac, is_primary FROM chips ORDER BY chip_id")
            .fetch_all(&mut *conn)
            .await?,
        punches: sqlx::query_as(
            "SELECT punch_id, event_id, siac, control_code, punch_time, source, is_duplicate, \
             processed, received_at FROM punches ORDER BY punch_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        race_states: sqlx::query_as(
            "SELECT event_id, ingest_paused, standings_frozen, frozen_at, frozen_snapshot \
             FROM race_state ORDER BY event_id",
        )
        .fetch_all(&mut *conn)
        .await?,
        audit_log: sqlx::query_as(
            "SELECT audit_id, event_id, created_at, action, entity_type, entity_id, details, source \
             FROM audit_log ORDER BY audit_id",
        )
        .fetch_all(&mut *conn)
        .await?,
    })
}

async fn clear(conn: &mut SqliteConnection) -> Result<()> {
    for table in [
        "audit_log",
        "race_state",
        "punches",
        "chips",
        "entries",
        "classes",
        "course_stages",
        "courses",
        "stages",
        "controls",
        "events",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn apply(conn: &mut SqliteConnection, file: &BackupFile) -> Result<()> {
    for e in &file.events {
        sqlx::query(
            "INSERT INTO events (event_id, name, event_date, location, format, time_precision, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(e.event_id)
        .bind(&e.name)
        .bind(e.event_date)
        .bind(&e.location)
        .bind(&e.format)
        .bind(e.time_precision.as_str())
        .bind(e.status.as_str())
        .bind(e.created_at)
        .execute(&mut *conn)
        .await?;
    }

    for c in &file.controls {
        sqlx::query(
            "INSERT INTO controls (control_id, event_id, code, name, control_type) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(c.control_id)
        .bind(c.event_id)
        .bind(c.code)
        .bind(&c.name)
        .bind(c.control_type.as_str())
        .execute(&mut *conn)
        .await?;
    }

    for s in &file.stages {
        sqlx::query(
            "INSERT INTO stages (stage_id, event_id, stage_number, name, start_control_id, \
             finish_control_id, is_timed, runs_to_count, max_runs) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(s.stage_id)
        .bind(s.event_id)
        .bind(s.stage_number)
        .bind(&s.name)
        .bind(s.start_control_id)
        .bind(s.finish_control_id)
        .bind(s.is_timed)
        .bind(s.runs_to_count)
        .bind(s.max_runs)
        .execute(&mut *conn)
        .await?;
    }

    for c in &file.courses {
        sqlx::query(
            "INSERT INTO courses (course_id, event_id, name, laps, stages_any_order, allow_repeat) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(c.course_id)
        .bind(c.event_id)
        .bind(&c.name)
        .bind(c.laps)
        .bind(c.stages_any_order)
        .bind(c.allow_repeat)
        .execute(&mut *conn)
        .await?;
    }

    for cs in &file.course_stages {
        sqlx::query("INSERT INTO course_stages (course_id, stage_id, position) VALUES (?, ?, ?)")
            .bind(cs.course_id)
            .bind(cs.stage_id)
            .bind(cs.position)
            .execute(&mut *conn)
            .await?;
    }

    for c in &file.classes {
        sqlx::query("INSERT INTO classes (class_id, event_id, name, course_id) VALUES (?, ?, ?, ?)")
            .bind(c.class_id)
            .bind(c.event_id)
            .bind(&c.name)
            .bind(c.course_id)
            .execute(&mut *conn)
            .await?;
    }

    for e in &file.entries {
        sqlx::query(
            "INSERT INTO entries (entry_id, event_id, bib, first_name, last_name, club, class_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(e.entry_id)
        .bind(e.event_id)
        .bind(e.bib)
        .bind(&e.first_name)
        .bind(&e.last_name)
        .bind(&e.club)
        .bind(e.class_id)
        .execute(&mut *conn)
        .await?;
    }

    for c in &file.chips {
        sqlx::query("INSERT INTO chips (chip_id, event_id, bib, siac, is_primary) VALUES (?, ?, ?, ?, ?)")
            .bind(c.chip_id)
            .bind(c.event_id)
            .bind(c.bib)
            .bind(&c.siac)
            .bind(c.is_primary)
            .execute(&mut *conn)
            .await?;
    }

    for p in &file.punches {
        sqlx::query(
            "INSERT INTO punches (punch_id, event_id, siac, control_code, punch_time, source, \
             is_duplicate, processed, received_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(p.punch_id)
        .bind(p.event_id)
        .bind(&p.siac)
        .bind(p.control_code)
        .bind(p.punch_time)
        .bind(p.source.as_str())
        .bind(p.is_duplicate)
        .bind(p.processed)
        .bind(p.received_at)
        .execute(&mut *conn)
        .await?;
    }

    for r in &file.race_states {
        sqlx::query(
            "INSERT INTO race_state (event_id, ingest_paused, standings_frozen, frozen_at, frozen_snapshot) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(r.event_id)
        .bind(r.ingest_paused)
        .bind(r.standings_frozen)
        .bind(r.frozen_at)
        .bind(&r.frozen_snapshot)
        .execute(&mut *conn)
        .await?;
    }

    for a in &file.audit_log {
        sqlx::query(
            "INSERT INTO audit_log (audit_id, event_id, created_at, action, entity_type, entity_id, details, source) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(a.audit_id)
        .bind(a.event_id)
        .bind(a.created_at)
        .bind(&a.action)
        .bind(&a.entity_type)
        .bind(a.entity_id)
        .bind(&a.details)
        .bind(&a.source)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingest::IngestSettings;
    use crate::services::race_control::RaceControl;
    use crate::services::testing::Fixture;

    async fn timed_race() -> Fixture {
        let fx = Fixture::single_stage(1, None).await;
        fx.entrant(101, "8001").await;
        fx.entrant(102, "8002").await;
        fx.ride("8001", 0, "10:00:00.0", "10:01:02.3").await;
        fx.ride("8002", 0, "10:01:00.0", "10:01:59.9").await;
        fx.punch("8002", 32, "10:02:01.0").await;
        fx
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Before SS3 protest!"), "before-ss3-protest");
        assert_eq!(slug("  ***  "), "backup");
    }

    #[tokio::test]
    async fn test_restore_returns_to_backup_state() {
        let fx = timed_race().await;
        let dir = tempfile::tempdir().unwrap();
        let backups = BackupService::new(&fx.db, dir.path());
        let control = RaceControl::new(&fx.db, IngestSettings::default());

        let expected = control.recompute(fx.event_id).await.unwrap();
        let standings = control.standings(fx.event_id, None, true).await.unwrap();
        let descriptor = backups.create("before protest").await.unwrap();
        assert_eq!(descriptor.counts.punches, 5);
        assert_eq!(descriptor.counts.entries, 2);

        fx.entrant(103, "8003").await;
        fx.ride("8003", 0, "10:03:00.0", "10:03:40.0").await;

        let counts = backups
            .restore(&RestoreRequest {
                filename: descriptor.filename.clone(),
                confirm: true,
            })
            .await
            .unwrap();
        assert_eq!(counts, descriptor.counts);

        let restored = control.recompute(fx.event_id).await.unwrap();
        assert_eq!(restored.stage_results, expected.stage_results);
        assert_eq!(restored.overall, expected.overall);
        assert_eq!(
            control.standings(fx.event_id, None, true).await.unwrap(),
            standings
        );

        let listed = backups.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].label, "before protest");
    }

    #[tokio::test]
    async fn test_restore_requires_confirmation() {
        let fx = timed_race().await;
        let dir = tempfile::tempdir().unwrap();
        let backups = BackupService::new(&fx.db, dir.path());
        let descriptor = backups.create("race").await.unwrap();

        let err = backups
            .restore(&RestoreRequest {
                filename: descriptor.filename,
                confirm: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConfirmationRequired));
    }

    #[tokio::test]
    async fn test_broken_backup_leaves_state_intact() {
        let fx = timed_race().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{\"version\": 1, \"label\": ").unwrap();
        let backups = BackupService::new(&fx.db, dir.path());

        let err = backups
            .restore(&RestoreRequest {
                filename: "broken.json".to_string(),
                confirm: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));

        let err = backups
            .restore(&RestoreRequest {
                filename: "../etc/passwd.json".to_string(),
                confirm: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));

        let punches = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM punches")
            .fetch_one(fx.db.pool())
            .await
            .unwrap();
        assert_eq!(punches, 5);
        assert!(backups.list().await.unwrap().is_empty());
    }
}
