//! Running accuracy statistics
//!
//! Session counters; they only grow until [`LearningStats::reset`].

use serde::{Deserialize, Serialize};

use crate::models::{CategorySource, ConfidenceTier};

/// Assumed accuracy of each confidence tier
const HIGH_TIER_ACCURACY: f64 = 0.98;
const MEDIUM_TIER_ACCURACY: f64 = 0.85;
const LOW_TIER_ACCURACY: f64 = 0.60;

/// Share of the tier blend once user feedback exists
const TIER_WEIGHT: f64 = 0.7;
const FEEDBACK_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_processed: u64,
    pub high_confidence: u64,
    pub medium_confidence: u64,
    pub low_confidence: u64,
    /// Items answered by the remote classifier
    pub remote_success: u64,
    /// Items that did not get a remote answer (learned + rules + no opinion)
    pub fallback_count: u64,
    pub learned_count: u64,
    pub rule_count: u64,
    pub no_opinion_count: u64,
    /// Items forced to `uncategorized` as financial movements
    pub financial_movement_count: u64,
    pub user_corrections: u64,
    pub user_confirmations: u64,
    pub estimated_accuracy: f64,
}

impl LearningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one categorized transaction
    pub fn record(&mut self, tier: ConfidenceTier, source: CategorySource) {
        self.total_processed += 1;
        match tier {
            ConfidenceTier::High => self.high_confidence += 1,
            ConfidenceTier::Medium => self.medium_confidence += 1,
            ConfidenceTier::Low => self.low_confidence += 1,
        }
        match source {
            CategorySource::Remote => self.remote_success += 1,
            CategorySource::FinancialMovement => self.financial_movement_count += 1,
            CategorySource::Learned => {
                self.fallback_count += 1;
                self.learned_count += 1;
            }
            CategorySource::Rules => {
                self.fallback_count += 1;
                self.rule_count += 1;
            }
            CategorySource::None => {
                self.fallback_count += 1;
                self.no_opinion_count += 1;
            }
        }
        self.recompute();
    }

    pub fn record_correction(&mut self) {
        self.user_corrections += 1;
        self.recompute();
    }

    pub fn record_confirmation(&mut self) {
        self.user_confirmations += 1;
        self.recompute();
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn recompute(&mut self) {
        let tiered = self.high_confidence + self.medium_confidence + self.low_confidence;
        let tier_accuracy = if tiered == 0 {
            0.0
        } else {
            (self.high_confidence as f64 * HIGH_TIER_ACCURACY
                + self.medium_confidence as f64 * MEDIUM_TIER_ACCURACY
                + self.low_confidence as f64 * LOW_TIER_ACCURACY)
                / tiered as f64
        };

        let feedback = self.user_confirmations + self.user_corrections;
        self.estimated_accuracy = if feedback == 0 {
            tier_accuracy
        } else {
            let confirmation_ratio = self.user_confirmations as f64 / feedback as f64;
            TIER_WEIGHT * tier_accuracy + FEEDBACK_WEIGHT * confirmation_ratio
        };
    }
}
