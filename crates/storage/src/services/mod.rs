pub mod backup;
pub mod dedup;
pub mod import;
pub mod ingest;
pub mod overall;
pub mod race_control;
mod ranking;
pub mod snapshot;
pub mod stage_results;

#[cfg(test)]
pub(crate) mod testing;

pub use backup::BackupService;
pub use ingest::{IngestSettings, record_punch, resume_ingest};
pub use overall::{compute_overall, overall};
pub use race_control::RaceControl;
pub use snapshot::ResultsSnapshot;
pub use stage_results::{compute_stage_results, stage_results};
