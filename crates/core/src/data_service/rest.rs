//! PostgREST-style gateway client.
//!
//! Rows are read from `{base_url}/rest/v1/{table}` and ordered server-side, so
//! the client never re-sorts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DataService, ServiceError};
use crate::config::DataServiceConfig;
use crate::film::FilmRecord;

/// REST client for the film table.
pub struct RestDataService {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestDataService {
    /// Create a new client from configuration.
    pub fn new(config: &DataServiceConfig) -> Result<Self, ServiceError> {
        if config.api_key.is_empty() {
            return Err(ServiceError::NotConfigured(
                "data service API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let endpoint = format!(
            "{}/rest/v1/{}",
            config.url.trim_end_matches('/'),
            config.table
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Full URL of the film table.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DataService for RestDataService {
    async fn fetch_all(&self) -> Result<Vec<FilmRecord>, ServiceError> {
        debug!("Fetching films from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("order", "rating.desc")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(ServiceError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_films(&body)
    }
}

/// Decode a response body into validated film records.
///
/// A `null` body means the table had nothing to return.
pub(crate) fn parse_films(body: &str) -> Result<Vec<FilmRecord>, ServiceError> {
    let rows: Option<Vec<FilmRecord>> = serde_json::from_str(body)
        .map_err(|e| ServiceError::Parse(format!("Failed to parse film rows: {}", e)))?;

    let films = rows.unwrap_or_default();
    for film in &films {
        film.validate()?;
    }

    Ok(films)
}
