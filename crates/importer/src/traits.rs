use storage::dto::punch::NewPunch;

use crate::Result;

/// A punch as reported by an external timing provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPunch {
    /// Provider-side record id, increasing within a competition.
    pub id: i64,
    pub control_code: i64,
    pub siac: String,
    pub timestamp: String,
}

/// Source of punches for the bridge.
#[async_trait::async_trait]
pub trait PunchProvider: Send + Sync {
    /// Records of `competition` with an id greater than `after`, oldest first.
    async fn fetch(&self, competition: &str, after: Option<i64>) -> Result<Vec<ProviderPunch>>;

    fn name(&self) -> &'static str;
}

/// Destination for bridged punches. The service routes these through the
/// same ingestion path as manual and chip-reader punches.
#[async_trait::async_trait]
pub trait PunchSink: Send + Sync {
    async fn record(&self, punch: NewPunch) -> Result<()>;
}
