//! Remote classifier client
//!
//! Batch-submits descriptions to a remote categorization service and maps its
//! vocabulary onto [`Category`].
//!
//! # Architecture
//!
//! - `ClassifierBackend` trait: one batch request, a probe, the host for logging
//! - `ClassifierClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `HttpBackend`, `MockBackend`
//!
//! Failures are soft and per batch: a failed request gives every item of that
//! batch "no opinion" and the run carries on.
//!
//! # Configuration
//!
//! Environment variables:
//! - `CLASSIFIER_BACKEND`: Backend to use (http, mock). Default: http
//! - `TALLY_CLASSIFIER_URL`: Endpoint URL (required for http backend)
//! - `TALLY_CLASSIFIER_API_KEY`: API key (required when the URL is set)

mod http;
pub mod labels;
mod mock;

pub use http::HttpBackend;
pub use labels::{lookup_label, map_label, normalize_label};
pub use mock::MockBackend;
#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::vendor_label_for;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::Result;
use crate::models::Category;

/// Fixed batch sent by the connectivity probe
pub const PROBE_DESCRIPTIONS: [&str; 2] = ["test transaction", "grocery store purchase"];

/// Trait defining the interface for all classifier backends
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Classify one batch; the result is aligned positionally with the input
    async fn classify_batch(&self, descriptions: &[String]) -> Result<Vec<String>>;

    /// Check if the backend is reachable and answering
    async fn health_check(&self) -> bool;

    /// Get the host/endpoint (for logging)
    fn host(&self) -> &str;
}

/// Result of classifying a whole list in batches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteOutcome {
    /// One entry per input, `None` where the batch failed
    pub labels: Vec<Option<Category>>,
    /// Requests sent
    pub batches: usize,
    /// Requests that failed
    pub failed_batches: usize,
    /// Message of the last failure
    pub last_error: Option<String>,
}

impl RemoteOutcome {
    /// All items with no opinion (remote disabled)
    pub fn unavailable(len: usize) -> Self {
        Self {
            labels: vec![None; len],
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failed_batches > 0
    }
}

/// Concrete classifier client enum
#[derive(Clone)]
pub enum ClassifierClient {
    /// HTTP classification service
    Http(HttpBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ClassifierClient {
    /// Create a classifier client from environment variables
    ///
    /// Checks `CLASSIFIER_BACKEND` to determine which backend to use:
    /// - `http` (default): uses TALLY_CLASSIFIER_URL and TALLY_CLASSIFIER_API_KEY
    /// - `mock`: creates a mock backend
    ///
    /// Returns `Ok(None)` when no remote classifier is configured.
    pub fn from_env(config: &RemoteConfig) -> Result<Option<Self>> {
        let backend = std::env::var("CLASSIFIER_BACKEND").unwrap_or_else(|_| "http".to_string());

        match backend.to_lowercase().as_str() {
            "http" => Ok(HttpBackend::from_env(config)?.map(ClassifierClient::Http)),
            "mock" => Ok(Some(ClassifierClient::Mock(MockBackend::new()))),
            _ => {
                warn!(backend = %backend, "Unknown CLASSIFIER_BACKEND, falling back to http");
                Ok(HttpBackend::from_env(config)?.map(ClassifierClient::Http))
            }
        }
    }

    /// Create an HTTP client directly
    pub fn http(endpoint: &str, api_key: &str, config: &RemoteConfig) -> Result<Self> {
        HttpBackend::new(endpoint, api_key, config).map(ClassifierClient::Http)
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ClassifierClient::Mock(MockBackend::new())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            ClassifierClient::Http(_) => "http",
            ClassifierClient::Mock(_) => "mock",
        }
    }

    /// Classify every description in chunks of at most `batch_size`
    ///
    /// Chunks are awaited in order so positions line up with the input. Each
    /// failed chunk leaves `None` for its items.
    pub async fn classify_all(&self, descriptions: &[String], batch_size: usize) -> RemoteOutcome {
        let batch_size = batch_size.max(1);
        let mut outcome = RemoteOutcome {
            labels: Vec::with_capacity(descriptions.len()),
            ..RemoteOutcome::default()
        };

        for (index, chunk) in descriptions.chunks(batch_size).enumerate() {
            outcome.batches += 1;
            match self.classify_batch(chunk).await {
                Ok(labels) => {
                    debug!(batch = index, size = chunk.len(), "Remote batch classified");
                    outcome
                        .labels
                        .extend(labels.iter().map(|label| Some(map_label(label))));
                }
                Err(e) => {
                    warn!(
                        host = %self.host(),
                        batch = index,
                        size = chunk.len(),
                        error = %e,
                        "Remote classifier batch failed, falling back"
                    );
                    outcome.failed_batches += 1;
                    outcome.last_error = Some(e.to_string());
                    outcome.labels.extend(std::iter::repeat(None).take(chunk.len()));
                }
            }
        }

        outcome
    }
}

// Implement ClassifierBackend for ClassifierClient by delegating to the inner backend
#[async_trait]
impl ClassifierBackend for ClassifierClient {
    async fn classify_batch(&self, descriptions: &[String]) -> Result<Vec<String>> {
        match self {
            ClassifierClient::Http(b) => b.classify_batch(descriptions).await,
            ClassifierClient::Mock(b) => b.classify_batch(descriptions).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ClassifierClient::Http(b) => b.health_check().await,
            ClassifierClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            ClassifierClient::Http(b) => b.host(),
            ClassifierClient::Mock(b) => b.host(),
        }
    }
}
