use std::collections::HashMap;

use serde_json::json;

use crate::Database;
use crate::dto::audit::NewAuditEntry;
use crate::dto::chip::{ChipImportRow, CreateChipRequest};
use crate::dto::entry::{CreateEntryRequest, EntryImportRow};
use crate::dto::import::ImportReport;
use crate::error::{Result, StorageError};
use crate::repository::audit::AuditRepository;
use crate::repository::chip::ChipRepository;
use crate::repository::class::ClassRepository;
use crate::repository::entry::EntryRepository;
use crate::repository::event::EventRepository;

/// Registers or overwrites entries by bib. Rows naming an unknown class or
/// missing a name are skipped with a warning instead of failing the batch.
pub async fn import_entries(db: &Database, event_id: i64, rows: Vec<EntryImportRow>) -> Result<ImportReport> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;

    let classes: HashMap<String, i64> = ClassRepository::new(db.pool())
        .list(event_id)
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.class_id))
        .collect();

    let entries = EntryRepository::new(db.pool());
    let mut report = ImportReport::default();

    for row in rows {
        if row.bib < 1 {
            report.warn(format!("bib {}: bib must be a positive number", row.bib));
            continue;
        }
        if row.first_name.trim().is_empty() || row.last_name.trim().is_empty() {
            report.warn(format!("bib {}: first and last name are required", row.bib));
            continue;
        }
        let Some(&class_id) = classes.get(&row.class.trim().to_lowercase()) else {
            report.warn(format!("bib {}: unknown class '{}'", row.bib, row.class));
            continue;
        };

        let club = row
            .club
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        entries
            .upsert(
                event_id,
                &CreateEntryRequest {
                    bib: row.bib,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    club,
                    class_id,
                },
            )
            .await?;
        report.imported += 1;
    }

    audit_import(db, event_id, "entries.import", "entry", &report).await?;
    tracing::info!(event_id, imported = report.imported, warnings = report.warnings.len(), "Entries imported");

    Ok(report)
}

/// Registers chips. A row for an unregistered bib is skipped with a warning.
pub async fn import_chips(db: &Database, event_id: i64, rows: Vec<ChipImportRow>) -> Result<ImportReport> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;

    let chips = ChipRepository::new(db.pool());
    let mut report = ImportReport::default();

    for row in rows {
        let siac = row.siac.trim();
        if siac.is_empty() {
            report.warn(format!("bib {}: transponder id is empty", row.bib));
            continue;
        }

        let req = CreateChipRequest {
            bib: row.bib,
            siac: siac.to_string(),
            is_primary: row.is_primary,
        };

        match chips.create(event_id, &req).await {
            Ok(_) => report.imported += 1,
            Err(StorageError::Validation { message, .. }) => {
                report.warn(format!("chip {siac}: {message}"));
            }
            Err(e) => return Err(e),
        }
    }

    audit_import(db, event_id, "chips.import", "chip", &report).await?;
    tracing::info!(event_id, imported = report.imported, warnings = report.warnings.len(), "Chips imported");

    Ok(report)
}

async fn audit_import(
    db: &Database,
    event_id: i64,
    action: &str,
    entity_type: &str,
    report: &ImportReport,
) -> Result<()> {
    AuditRepository::new(db.pool())
        .append(
            &NewAuditEntry::new(Some(event_id), action, entity_type)
                .details(&json!({ "imported": report.imported, "warnings": report.warnings.len() })),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    fn row(bib: i64, class: &str) -> EntryImportRow {
        EntryImportRow {
            bib,
            first_name: "Anna".to_string(),
            last_name: format!("Rider{bib}"),
            club: Some(" OK Ravinen ".to_string()),
            class: class.to_string(),
        }
    }

    #[tokio::test]
    async fn test_bad_rows_become_warnings() {
        let fx = Fixture::single_stage(1, None).await;

        let report = import_entries(
            &fx.db,
            fx.event_id,
            vec![row(1, "Open"), row(2, "Veterans"), row(3, "open"), row(0, "Open")],
        )
        .await
        .unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("Veterans"));

        let stored = EntryRepository::new(fx.db.pool())
            .find_by_bib(fx.event_id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.club.as_deref(), Some("OK Ravinen"));
    }

    #[tokio::test]
    async fn test_chip_for_unknown_bib_is_skipped() {
        let fx = Fixture::single_stage(1, None).await;
        fx.entrant(101, "8001").await;

        let report = import_chips(
            &fx.db,
            fx.event_id,
            vec![
                ChipImportRow {
                    bib: 101,
                    siac: "8101".to_string(),
                    is_primary: true,
                },
                ChipImportRow {
                    bib: 555,
                    siac: "8555".to_string(),
                    is_primary: true,
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.warnings.len(), 1);

        let chips = ChipRepository::new(fx.db.pool()).list(fx.event_id).await.unwrap();
        let primary: Vec<&str> = chips
            .iter()
            .filter(|c| c.bib == 101 && c.is_primary)
            .map(|c| c.siac.as_str())
            .collect();
        assert_eq!(primary, vec!["8101"]);
    }
}
