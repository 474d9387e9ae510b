use importer::csv_import;
use storage::{
    Database,
    dto::audit::NewAuditEntry,
    dto::chip::{ChipImportRow, CreateChipRequest, UpdateChipRequest},
    dto::entry::{CreateEntryRequest, EntryImportRow, UpdateEntryRequest},
    dto::import::ImportReport,
    error::Result,
    models::{Chip, Entry},
    repository::chip::ChipRepository,
    repository::entry::EntryRepository,
    repository::event::EventRepository,
    services::import,
};

use crate::error::WebResult;
use crate::features::audit::services as audit;

pub async fn list_entries(db: &Database, event_id: i64, class_id: Option<i64>) -> Result<Vec<Entry>> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;
    EntryRepository::new(db.pool()).list(event_id, class_id).await
}

pub async fn get_entry(db: &Database, event_id: i64, entry_id: i64) -> Result<Entry> {
    EntryRepository::new(db.pool()).find_by_id(event_id, entry_id).await
}

pub async fn create_entry(db: &Database, event_id: i64, req: &CreateEntryRequest) -> Result<Entry> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;
    let entry = EntryRepository::new(db.pool()).create(event_id, req).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "entry.create", "entry")
            .entity(entry.entry_id)
            .details(req),
    )
    .await?;

    Ok(entry)
}

pub async fn update_entry(
    db: &Database,
    event_id: i64,
    entry_id: i64,
    req: &UpdateEntryRequest,
) -> Result<Entry> {
    let repo = EntryRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, entry_id).await?;
    let entry = repo.update(&existing, req).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "entry.update", "entry")
            .entity(entry_id)
            .details(req),
    )
    .await?;

    Ok(entry)
}

pub async fn delete_entry(db: &Database, event_id: i64, entry_id: i64) -> Result<()> {
    let repo = EntryRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, entry_id).await?;
    repo.delete(event_id, entry_id).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "entry.delete", "entry")
            .entity(entry_id)
            .details(&existing),
    )
    .await
}

pub async fn import_entries(db: &Database, event_id: i64, rows: Vec<EntryImportRow>) -> Result<ImportReport> {
    import::import_entries(db, event_id, rows).await
}

/// Imports a `bib,first_name,last_name,club,class` CSV body. Parse warnings
/// come first in the report.
pub async fn import_entries_csv(db: &Database, event_id: i64, body: &str) -> WebResult<ImportReport> {
    let parsed = csv_import::parse_entries(body.as_bytes())?;
    let report = import::import_entries(db, event_id, parsed.rows).await?;

    Ok(report.merge_warnings(parsed.warnings))
}

pub async fn list_chips(db: &Database, event_id: i64) -> Result<Vec<Chip>> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;
    ChipRepository::new(db.pool()).list(event_id).await
}

pub async fn create_chip(db: &Database, event_id: i64, req: &CreateChipRequest) -> Result<Chip> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;
    let chip = ChipRepository::new(db.pool()).create(event_id, req).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "chip.create", "chip")
            .entity(chip.chip_id)
            .details(req),
    )
    .await?;

    Ok(chip)
}

pub async fn update_chip(db: &Database, event_id: i64, chip_id: i64, req: &UpdateChipRequest) -> Result<Chip> {
    let chip = ChipRepository::new(db.pool()).update(event_id, chip_id, req).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "chip.update", "chip")
            .entity(chip_id)
            .details(req),
    )
    .await?;

    Ok(chip)
}

pub async fn delete_chip(db: &Database, event_id: i64, chip_id: i64) -> Result<()> {
    let removed = ChipRepository::new(db.pool()).delete(event_id, chip_id).await?;

    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), "chip.delete", "chip")
            .entity(chip_id)
            .details(&removed),
    )
    .await
}

pub async fn import_chips(db: &Database, event_id: i64, rows: Vec<ChipImportRow>) -> Result<ImportReport> {
    import::import_chips(db, event_id, rows).await
}

/// Imports a `bib,siac,primary` CSV body
pub async fn import_chips_csv(db: &Database, event_id: i64, body: &str) -> WebResult<ImportReport> {
    let parsed = csv_import::parse_chips(body.as_bytes())?;
    let report = import::import_chips(db, event_id, parsed.rows).await?;

    Ok(report.merge_warnings(parsed.warnings))
}
