use storage::{
    dto::backup::{BackupDescriptor, EntityCounts, RestoreRequest},
    error::Result,
};

use crate::state::AppState;

pub async fn list_backups(state: &AppState) -> Result<Vec<BackupDescriptor>> {
    state.backups().list().await
}

pub async fn create_backup(state: &AppState, label: &str) -> Result<BackupDescriptor> {
    state.backups().create(label).await
}

/// Replaces all state with the backup. Running bridges are stopped first
/// since their cursors refer to the replaced log.
pub async fn restore_backup(state: &AppState, req: &RestoreRequest) -> Result<EntityCounts> {
    if req.confirm {
        let bridges: Vec<_> = state.bridges.iter().map(|entry| entry.value().clone()).collect();
        state.bridges.clear();
        for bridge in bridges {
            bridge.stop().await;
        }
    }

    state.backups().restore(req).await
}
