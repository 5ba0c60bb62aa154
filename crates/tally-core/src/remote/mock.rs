//! Mock classifier backend
//!
//! Deterministic, in-process, speaks the vendor vocabulary. Useful for unit tests
//! and for running the CLI without a classifier endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ClassifierBackend;

/// Vendor label the mock (and the mock HTTP server) answers for a description
pub(crate) fn vendor_label_for(description: &str) -> &'static str {
    let d = description.to_uppercase();
    match d.as_str() {
        d if d.contains("UBER EATS") || d.contains("DOORDASH") => "Food and Drink",
        d if d.contains("NETFLIX") || d.contains("SPOTIFY") || d.contains("HULU") => {
            "Entertainment"
        }
        d if d.contains("STARBUCKS") || d.contains("MCDONALD") || d.contains("RESTAURANT") => {
            "Food and Drink"
        }
        d if d.contains("UBER") || d.contains("LYFT") => "Travel",
        d if d.contains("SHELL") || d.contains("CHEVRON") || d.contains("EXXON") => {
            "Auto & Transport"
        }
        d if d.contains("WHOLE FOODS") || d.contains("WHOLEFDS") || d.contains("TRADER JOE") => {
            "Groceries"
        }
        d if d.contains("AMAZON") || d.contains("TARGET") || d.contains("COSTCO") => "Shops",
        d if d.contains("COMCAST") || d.contains("VERIZON") => "Bills & Utilities",
        d if d.contains("CVS") || d.contains("WALGREENS") => "Medical",
        d if d.contains("RENT PAYMENT") || d.contains("LANDLORD") => "Rent",
        d if d.contains("TUITION") => "Education",
        d if d.contains("VENMO") || d.contains("ZELLE") => "Transfer",
        _ => "Other",
    }
}

/// Mock classifier backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether requests (and the health check) succeed
    pub healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a backend whose every request fails
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Number of batch requests served so far (shared across clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifierBackend for MockBackend {
    async fn classify_batch(&self, descriptions: &[String]) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.healthy {
            return Err(Error::Remote("mock classifier is unavailable".into()));
        }
        Ok(descriptions
            .iter()
            .map(|d| vendor_label_for(d).to_string())
            .collect())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
