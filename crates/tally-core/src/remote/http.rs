//! HTTP classifier backend
//!
//! `POST <endpoint>` with the API key header and a JSON array of description
//! strings; a 200 answer is a JSON array of label strings aligned with the request.
//!
//! # Configuration
//!
//! Environment variables:
//! - `TALLY_CLASSIFIER_URL`: Endpoint URL (required)
//! - `TALLY_CLASSIFIER_API_KEY`: API key (required)

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};

use super::{ClassifierBackend, PROBE_DESCRIPTIONS};

/// HTTP classifier backend
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    endpoint: String,
    api_key: String,
    api_key_header: String,
}

impl HttpBackend {
    /// Create a backend for `endpoint` using the timeout and key header from `config`
    pub fn new(endpoint: &str, api_key: &str, config: &RemoteConfig) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(Error::Config("classifier endpoint is empty".into()));
        }
        if api_key.trim().is_empty() {
            return Err(Error::Config("classifier API key is empty".into()));
        }

        let http_client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_key_header: config.api_key_header.clone(),
        })
    }

    /// Create from environment variables
    ///
    /// Returns `Ok(None)` when no endpoint is configured, and an error when an
    /// endpoint is set without a key.
    pub fn from_env(config: &RemoteConfig) -> Result<Option<Self>> {
        let Ok(endpoint) = std::env::var("TALLY_CLASSIFIER_URL") else {
            return Ok(None);
        };
        let api_key = std::env::var("TALLY_CLASSIFIER_API_KEY").map_err(|_| {
            Error::Config("TALLY_CLASSIFIER_URL is set but TALLY_CLASSIFIER_API_KEY is not".into())
        })?;
        Self::new(&endpoint, &api_key, config).map(Some)
    }
}

#[async_trait]
impl ClassifierBackend for HttpBackend {
    async fn classify_batch(&self, descriptions: &[String]) -> Result<Vec<String>> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(self.api_key_header.as_str(), self.api_key.as_str())
            .json(descriptions)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote(format!("classifier returned HTTP {}", status)));
        }

        let body = response.text().await?;
        let labels: Vec<String> = serde_json::from_str(&body)?;
        if labels.len() != descriptions.len() {
            return Err(Error::Remote(format!(
                "classifier returned {} labels for {} descriptions",
                labels.len(),
                descriptions.len()
            )));
        }

        debug!(endpoint = %self.endpoint, batch = descriptions.len(), "Classifier batch ok");
        Ok(labels)
    }

    async fn health_check(&self) -> bool {
        let probe: Vec<String> = PROBE_DESCRIPTIONS.iter().map(|s| s.to_string()).collect();
        match self.classify_batch(&probe).await {
            Ok(_) => true,
            Err(e) => {
                debug!(endpoint = %self.endpoint, error = %e, "Classifier probe failed");
                false
            }
        }
    }

    fn host(&self) -> &str {
        &self.endpoint
    }
}
