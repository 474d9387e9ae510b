use sqlx::{SqliteConnection, SqlitePool};

use crate::dto::chip::{CreateChipRequest, UpdateChipRequest};
use crate::error::{Result, StorageError};
use crate::models::Chip;

/// Repository for Chip database operations
pub struct ChipRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChipRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, event_id: i64) -> Result<Vec<Chip>> {
        let chips = sqlx::query_as::<_, Chip>(
            r#"
            SELECT chip_id, event_id, bib, siac, is_primary
            FROM chips
            WHERE event_id = ?
            ORDER BY bib, chip_id
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(chips)
    }

    /// Register a chip for a bib.
    ///
    /// A primary chip demotes the bib's other chips; the first chip of a bib
    /// is always primary.
    pub async fn create(&self, event_id: i64, req: &CreateChipRequest) -> Result<Chip> {
        let mut tx = self.pool.begin().await?;

        let bib_known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM entries WHERE event_id = ? AND bib = ?",
        )
        .bind(event_id)
        .bind(req.bib)
        .fetch_one(&mut *tx)
        .await?;

        if bib_known == 0 {
            return Err(StorageError::validation(
                "bib",
                format!("bib {} is not registered", req.bib),
            ));
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chips WHERE event_id = ? AND bib = ?",
        )
        .bind(event_id)
        .bind(req.bib)
        .fetch_one(&mut *tx)
        .await?;

        let is_primary = req.is_primary || existing == 0;

        if is_primary {
            sqlx::query("UPDATE chips SET is_primary = 0 WHERE event_id = ? AND bib = ?")
                .bind(event_id)
                .bind(req.bib)
                .execute(&mut *tx)
                .await?;
        }

        let chip = sqlx::query_as::<_, Chip>(
            r#"
            INSERT INTO chips (event_id, bib, siac, is_primary)
            VALUES (?, ?, ?, ?)
            RETURNING chip_id, event_id, bib, siac, is_primary
            "#,
        )
        .bind(event_id)
        .bind(req.bib)
        .bind(req.siac.trim())
        .bind(is_primary)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(chip)
    }

    /// Change a chip's transponder or primacy, keeping exactly one primary
    /// chip per bib.
    pub async fn update(&self, event_id: i64, id: i64, req: &UpdateChipRequest) -> Result<Chip> {
        let mut tx = self.pool.begin().await?;
        let existing = fetch_chip(&mut tx, event_id, id).await?;

        let siac = req.siac.as_deref().map(str::trim).unwrap_or(existing.siac.as_str());

        sqlx::query("UPDATE chips SET siac = ? WHERE chip_id = ?")
            .bind(siac)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        match req.is_primary {
            Some(true) if !existing.is_primary => {
                set_primary(&mut tx, event_id, existing.bib, id).await?;
            }
            Some(false) if existing.is_primary => {
                if let Some(successor) = newest_other_chip(&mut tx, event_id, existing.bib, id).await? {
                    set_primary(&mut tx, event_id, existing.bib, successor).await?;
                }
            }
            _ => {}
        }

        let chip = fetch_chip(&mut tx, event_id, id).await?;
        tx.commit().await?;
        Ok(chip)
    }

    /// Remove a chip. When it was the bib's primary chip, the newest
    /// remaining chip becomes primary.
    pub async fn delete(&self, event_id: i64, id: i64) -> Result<Chip> {
        let mut tx = self.pool.begin().await?;
        let existing = fetch_chip(&mut tx, event_id, id).await?;

        sqlx::query("DELETE FROM chips WHERE chip_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if existing.is_primary
            && let Some(successor) = newest_other_chip(&mut tx, event_id, existing.bib, id).await?
        {
            set_primary(&mut tx, event_id, existing.bib, successor).await?;
        }

        tx.commit().await?;
        Ok(existing)
    }
}

async fn fetch_chip(conn: &mut SqliteConnection, event_id: i64, id: i64) -> Result<Chip> {
    sqlx::query_as::<_, Chip>(
        r#"
        SELECT chip_id, event_id, bib, siac, is_primary
        FROM chips
        WHERE event_id = ? AND chip_id = ?
        "#,
    )
    .bind(event_id)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StorageError::NotFound)
}

async fn newest_other_chip(
    conn: &mut SqliteConnection,
    event_id: i64,
    bib: i64,
    excluded: i64,
) -> Result<Option<i64>> {
    let successor = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT chip_id FROM chips
        WHERE event_id = ? AND bib = ? AND chip_id <> ?
        ORDER BY chip_id DESC
        LIMIT 1
        "#,
    )
    .bind(event_id)
    .bind(bib)
    .bind(excluded)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(successor)
}

async fn set_primary(conn: &mut SqliteConnection, event_id: i64, bib: i64, chip_id: i64) -> Result<()> {
    sqlx::query("UPDATE chips SET is_primary = (chip_id = ?) WHERE event_id = ? AND bib = ?")
        .bind(chip_id)
        .bind(event_id)
        .bind(bib)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::snapshot::ResultsSnapshot;
    use crate::services::testing::Fixture;

    fn chip(bib: i64, siac: &str, is_primary: bool) -> CreateChipRequest {
        CreateChipRequest {
            bib,
            siac: siac.to_string(),
            is_primary,
        }
    }

    #[tokio::test]
    async fn test_new_primary_demotes_previous() {
        let fx = Fixture::single_stage(1, None).await;
        fx.entrant(101, "8001").await;
        let chips = ChipRepository::new(fx.db.pool());

        let spare = chips.create(fx.event_id, &chip(101, "8002", false)).await.unwrap();
        assert!(!spare.is_primary);
        let swapped = chips.create(fx.event_id, &chip(101, "8003", true)).await.unwrap();
        assert!(swapped.is_primary);

        let primaries: Vec<String> = chips
            .list(fx.event_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_primary)
            .map(|c| c.siac)
            .collect();
        assert_eq!(primaries, vec!["8003".to_string()]);

        let snapshot = ResultsSnapshot::load(&fx.db, fx.event_id).await.unwrap();
        let bibs = snapshot.bib_by_siac();
        assert_eq!(bibs.get("8001"), Some(&101));
        assert_eq!(bibs.get("8003"), Some(&101));
    }

    async fn primaries(chips: &ChipRepository<'_>, event_id: i64) -> Vec<String> {
        chips
            .list(event_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_primary)
            .map(|c| c.siac)
            .collect()
    }

    #[tokio::test]
    async fn test_deleting_primary_promotes_newest_remaining() {
        let fx = Fixture::single_stage(1, None).await;
        fx.entrant(101, "8001").await;
        let chips = ChipRepository::new(fx.db.pool());

        chips.create(fx.event_id, &chip(101, "8002", false)).await.unwrap();
        let replacement = chips.create(fx.event_id, &chip(101, "8101", true)).await.unwrap();

        let removed = chips.delete(fx.event_id, replacement.chip_id).await.unwrap();
        assert_eq!(removed.siac, "8101");
        assert_eq!(primaries(&chips, fx.event_id).await, vec!["8002".to_string()]);

        let spare = chips.list(fx.event_id).await.unwrap();
        let last = spare.iter().find(|c| c.siac == "8002").unwrap().chip_id;
        chips.delete(fx.event_id, last).await.unwrap();
        assert_eq!(primaries(&chips, fx.event_id).await, vec!["8001".to_string()]);

        assert!(matches!(
            chips.delete(fx.event_id, last).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_moves_primacy_and_siac() {
        let fx = Fixture::single_stage(1, None).await;
        fx.entrant(101, "8001").await;
        let chips = ChipRepository::new(fx.db.pool());
        let spare = chips.create(fx.event_id, &chip(101, "8002", false)).await.unwrap();

        let promoted = chips
            .update(
                fx.event_id,
                spare.chip_id,
                &UpdateChipRequest {
                    siac: Some(" 8202 ".to_string()),
                    is_primary: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_primary);
        assert_eq!(promoted.siac, "8202");
        assert_eq!(primaries(&chips, fx.event_id).await, vec!["8202".to_string()]);

        let demoted = chips
            .update(
                fx.event_id,
                spare.chip_id,
                &UpdateChipRequest {
                    is_primary: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!demoted.is_primary);
        assert_eq!(primaries(&chips, fx.event_id).await, vec!["8001".to_string()]);

        let original = chips.list(fx.event_id).await.unwrap();
        let only = original.iter().find(|c| c.siac == "8001").unwrap().chip_id;
        chips.delete(fx.event_id, spare.chip_id).await.unwrap();
        let kept = chips
            .update(
                fx.event_id,
                only,
                &UpdateChipRequest {
                    is_primary: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(kept.is_primary);
    }

    #[tokio::test]
    async fn test_unknown_bib_is_rejected() {
        let fx = Fixture::single_stage(1, None).await;
        let err = ChipRepository::new(fx.db.pool())
            .create(fx.event_id, &chip(999, "8001", true))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation { ref field, .. } if field == "bib"));
    }
}
