use storage::{
    Database,
    dto::results::{StageResult, StandingsResponse},
    error::Result,
    repository::stage::StageRepository,
    services::{IngestSettings, RaceControl, stage_results},
};

/// Stage results straight from the log; the standings freeze does not apply
pub async fn get_stage_results(
    db: &Database,
    event_id: i64,
    stage_id: i64,
    class_id: Option<i64>,
) -> Result<Vec<StageResult>> {
    StageRepository::new(db.pool()).find_by_id(event_id, stage_id).await?;
    stage_results(db, event_id, stage_id, class_id).await
}

pub async fn get_standings(
    db: &Database,
    settings: IngestSettings,
    event_id: i64,
    class_id: Option<i64>,
    live: bool,
) -> Result<StandingsResponse> {
    RaceControl::new(db, settings)
        .standings(event_id, class_id, live)
        .await
}
