use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of a bulk import: malformed rows are skipped and reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn merge_warnings(mut self, warnings: Vec<String>) -> Self {
        let mut all = warnings;
        all.append(&mut self.warnings);
        self.warnings = all;
        self
    }
}
