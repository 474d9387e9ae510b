use anyhow::Context;
use storage::Database;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod hub;
mod routes;
mod state;
#[cfg(test)]
mod testing;
mod ws;

use config::Config;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::events::handlers::list_events,
        features::events::handlers::get_event,
        features::events::handlers::create_event,
        features::events::handlers::update_event,
        features::events::handlers::delete_event,
        features::events::handlers::activate_event,
        features::events::handlers::finish_event,
        features::course_model::handlers::list_controls,
        features::course_model::handlers::get_control,
        features::course_model::handlers::create_control,
        features::course_model::handlers::update_control,
        features::course_model::handlers::delete_control,
        features::course_model::handlers::list_stages,
        features::course_model::handlers::get_stage,
        features::course_model::handlers::create_stage,
        features::course_model::handlers::update_stage,
        features::course_model::handlers::delete_stage,
        features::course_model::handlers::list_courses,
        features::course_model::handlers::get_course,
        features::course_model::handlers::create_course,
        features::course_model::handlers::update_course,
        features::course_model::handlers::set_course_stages,
        features::course_model::handlers::delete_course,
        features::course_model::handlers::list_classes,
        features::course_model::handlers::get_class,
        features::course_model::handlers::create_class,
        features::course_model::handlers::update_class,
        features::course_model::handlers::delete_class,
        features::entries::handlers::list_entries,
        features::entries::handlers::get_entry,
        features::entries::handlers::create_entry,
        features::entries::handlers::update_entry,
        features::entries::handlers::delete_entry,
        features::entries::handlers::import_entries,
        features::entries::handlers::import_entries_csv,
        features::entries::handlers::list_chips,
        features::entries::handlers::create_chip,
        features::entries::handlers::update_chip,
        features::entries::handlers::delete_chip,
        features::entries::handlers::import_chips,
        features::entries::handlers::import_chips_csv,
        features::punches::handlers::list_punches,
        features::punches::handlers::get_punch,
        features::punches::handlers::create_punch,
        features::punches::handlers::delete_punch,
        features::results::handlers::get_stage_results,
        features::results::handlers::get_standings,
        features::race::handlers::get_race_state,
        features::race::handlers::pause_ingest,
        features::race::handlers::resume_ingest,
        features::race::handlers::freeze_standings,
        features::race::handlers::unfreeze_standings,
        features::race::handlers::recompute,
        features::race::handlers::post_highlight,
        features::race::handlers::post_stage_status,
        features::bridge::handlers::get_status,
        features::bridge::handlers::configure,
        features::bridge::handlers::start,
        features::bridge::handlers::stop,
        features::backups::handlers::list_backups,
        features::backups::handlers::create_backup,
        features::backups::handlers::restore_backup,
        features::audit::handlers::list_audit,
    ),
    components(
        schemas(
            storage::dto::event::CreateEventRequest,
            storage::dto::event::UpdateEventRequest,
            storage::dto::control::CreateControlRequest,
            storage::dto::control::UpdateControlRequest,
            storage::dto::stage::CreateStageRequest,
            storage::dto::stage::UpdateStageRequest,
            storage::dto::course::CreateCourseRequest,
            storage::dto::course::UpdateCourseRequest,
            storage::dto::course::SetCourseStagesRequest,
            storage::dto::course::CourseResponse,
            storage::dto::class::CreateClassRequest,
            storage::dto::class::UpdateClassRequest,
            storage::dto::entry::CreateEntryRequest,
            storage::dto::entry::UpdateEntryRequest,
            storage::dto::entry::EntryImportRow,
            storage::dto::chip::CreateChipRequest,
            storage::dto::chip::UpdateChipRequest,
            storage::dto::chip::ChipImportRow,
            storage::dto::import::ImportReport,
            storage::dto::punch::CreatePunchRequest,
            storage::dto::punch::IngestStatus,
            storage::dto::punch::IngestOutcome,
            storage::dto::results::ResultStatus,
            storage::dto::results::RunTime,
            storage::dto::results::StageResult,
            storage::dto::results::OverallStageTime,
            storage::dto::results::OverallResult,
            storage::dto::results::StandingsResponse,
            storage::dto::results::StatusCounts,
            storage::dto::results::RecomputeReport,
            storage::dto::race_state::RaceStateResponse,
            storage::dto::backup::CreateBackupRequest,
            storage::dto::backup::RestoreRequest,
            storage::dto::backup::EntityCounts,
            storage::dto::backup::BackupDescriptor,
            storage::models::Event,
            storage::models::EventStatus,
            storage::models::TimePrecision,
            storage::models::Control,
            storage::models::ControlType,
            storage::models::Stage,
            storage::models::Course,
            storage::models::Class,
            storage::models::Entry,
            storage::models::Chip,
            storage::models::Punch,
            storage::models::PunchSource,
            storage::models::AuditLogEntry,
            features::race::handlers::ResumeResponse,
            features::race::handlers::HighlightRequest,
            features::race::handlers::StageStatusRequest,
            features::race::handlers::BroadcastReceipt,
            features::bridge::handlers::StartBridgeRequest,
            features::bridge::handlers::ConfigureBridgeRequest,
            hub::Channel,
            hub::MessageKind,
            hub::HighlightPriority,
            hub::StageState,
            hub::HubMessage,
            hub::Subscription,
        )
    ),
    tags(
        (name = "events", description = "Event setup and lifecycle"),
        (name = "course_model", description = "Controls, stages, courses and classes"),
        (name = "entries", description = "Entrants, transponders and bulk import"),
        (name = "punches", description = "Timing log"),
        (name = "results", description = "Stage results and overall standings"),
        (name = "race", description = "Race-day gates, recompute and broadcasts"),
        (name = "bridge", description = "External timing provider bridge"),
        (name = "backups", description = "Backup and restore"),
        (name = "audit", description = "Audit log"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting race timing service");

    let config = Config::from_env().context("Failed to load service configuration")?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::new(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    db.run_migrations()
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let bind_address = format!("{}:{}", config.host, config.port);
    let state = AppState::new(db, config);

    let app = routes::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    tracing::info!("Server starting on http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
