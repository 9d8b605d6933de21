use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::IncidentsConfig;
use crate::error::{LocatorError, Result};
use crate::region::IncidentFilter;

/// One message from the police incident log
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
}

#[derive(Debug, Deserialize)]
struct IncidentResponse {
    #[serde(default)]
    data: Vec<IncidentMessage>,
}

/// Client for the police incident feed.
///
/// The core only decides the filter; this issues one request with it.
pub struct IncidentClient {
    client: Client,
    url: String,
}

impl IncidentClient {
    pub fn new(config: &IncidentsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn fetch(&self, filter: &IncidentFilter) -> Result<Vec<IncidentMessage>> {
        let response = self
            .client
            .get(&self.url)
            .query(&filter.query_pairs())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| LocatorError::Incidents(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocatorError::Incidents(format!(
                "incident feed returned status {}",
                response.status()
            )));
        }

        let body: IncidentResponse = response
            .json()
            .map_err(|e| LocatorError::Incidents(e.to_string()))?;
        log::debug!("Incident feed returned {} messages", body.data.len());
        Ok(body.data)
    }
}
