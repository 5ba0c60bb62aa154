//! Tally Core Library
//!
//! Transaction categorization pipeline for the Tally personal finance app:
//! - Deterministic rule engine over a static merchant/pattern database
//! - Personal learning engine fed by user corrections and confirmations
//! - Pluggable remote classifier backends (HTTP service, mock)
//! - Orchestrator with confidence tiers, review queue and accuracy stats
//! - Two-layer TOML configuration

pub mod categorizer;
pub mod config;
pub mod error;
pub mod learning;
pub mod models;
pub mod remote;
pub mod review;
pub mod rules;
pub mod stats;

/// Test utilities including mock classifier server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use categorizer::{Categorizer, RunSummary};
pub use config::{CategorizerConfig, FallbackConfig, RemoteConfig, TierConfig};
pub use error::{Error, Result};
pub use learning::{
    CategoryPattern, LearnedPrediction, LearningEngine, LearningSnapshot, LearningSummary,
    MerchantMapping,
};
pub use models::{
    Categorization, Category, CategorySource, ConfidenceTier, Direction, ReviewEntry,
    ReviewPriority, Transaction,
};
pub use remote::{ClassifierBackend, ClassifierClient, HttpBackend, MockBackend, RemoteOutcome};
pub use review::ReviewQueue;
pub use rules::{RuleEngine, RuleMatch, RuleStage};
pub use stats::LearningStats;
