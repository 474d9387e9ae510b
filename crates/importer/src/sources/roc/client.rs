use std::time::Duration;

use super::models::parse_punches;
use crate::error::{ImporterError, Result};
use crate::traits::{ProviderPunch, PunchProvider};

pub const DEFAULT_BASE_URL: &str = "https://roc.olresultat.se";

/// Client for the ROC radio-control punch feed.
pub struct RocClient {
    base_url: String,
    client: reqwest::Client,
}

impl RocClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("racetime/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn punches_url(&self) -> String {
        format!("{}/getpunches.asp", self.base_url)
    }
}

#[async_trait::async_trait]
impl PunchProvider for RocClient {
    async fn fetch(&self, competition: &str, after: Option<i64>) -> Result<Vec<ProviderPunch>> {
        let last_id = after.unwrap_or(0).to_string();

        let response = self
            .client
            .get(self.punches_url())
            .query(&[("unitId", competition), ("lastId", last_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImporterError::ProviderError(format!(
                "ROC answered {status} for competition {competition}"
            )));
        }

        let body = response.text().await?;
        parse_punches(&body)
    }

    fn name(&self) -> &'static str {
        "ROC"
    }
}
