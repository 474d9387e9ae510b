use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AuditQuery {
    pub event_id: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl AuditQuery {
    pub fn validate(&self) -> Result<(), String> {
        if self.limit < 1 || self.limit > 1000 {
            return Err("limit must be between 1 and 1000".to_string());
        }
        Ok(())
    }
}

fn default_limit() -> i64 {
    100
}

/// An audit record about to be appended.
#[derive(Debug, Clone, Serialize)]
pub struct NewAuditEntry {
    pub event_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub details: String,
    pub source: String,
}

impl NewAuditEntry {
    pub fn new(event_id: Option<i64>, action: &str, entity_type: &str) -> Self {
        Self {
            event_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: None,
            details: String::new(),
            source: "operator".to_string(),
        }
    }

    pub fn entity(mut self, entity_id: i64) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Stores a JSON rendering of `details`.
    pub fn details<T: Serialize>(mut self, details: &T) -> Self {
        self.details = serde_json::to_string(details).unwrap_or_default();
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }
}
