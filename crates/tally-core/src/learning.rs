//! Personal learning engine
//!
//! Adapts to one user's corrections and confirmations. Two stores:
//!
//! - merchant mappings keyed by a normalized merchant key (first two significant
//!   tokens of the description)
//! - category patterns keyed by (token, category), where tokens are words longer
//!   than three characters and short point-of-sale prefixes like `tst*`
//!
//! There is no merchant database behind this; identity is inferred from usage
//! counters and amount ranges alone. A merchant the user keeps re-categorizing is
//! penalized, and a prediction is only offered above 0.7 confidence.
//!
//! The engine never learns on its own. Only explicit feedback
//! ([`LearningEngine::learn_from_correction`] and
//! [`LearningEngine::reinforce_correct_categorization`]) mutates it.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{clamp_confidence, Category, Transaction};

/// Minimum confidence for a merchant mapping to produce a prediction
const MERCHANT_MIN_CONFIDENCE: f64 = 0.7;
/// Slack around a pattern's amount range
const PATTERN_AMOUNT_SLACK: f64 = 10.0;
/// Patterns seen more often than this ignore the amount check
const STRONG_PATTERN_STRENGTH: u32 = 5;
const PATTERN_INITIAL_CONFIDENCE: f64 = 0.6;
const CORRECTION_STEP: f64 = 0.05;
const CORRECTION_CAP: f64 = 0.9;
const REINFORCE_STEP: f64 = 0.02;
const REINFORCE_CAP: f64 = 0.95;

fn non_alpha() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z\s]+").expect("valid regex"))
}

fn pos_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[^a-z])([a-z]{2,4})\*").expect("valid regex"))
}

/// Running min/max of observed amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    pub fn new(amount: f64) -> Self {
        Self {
            min: amount,
            max: amount,
        }
    }

    pub fn widen(&mut self, amount: f64) {
        self.min = self.min.min(amount);
        self.max = self.max.max(amount);
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }

    /// Distance from the range (0 when inside)
    pub fn distance(&self, amount: f64) -> f64 {
        if amount < self.min {
            self.min - amount
        } else if amount > self.max {
            amount - self.max
        } else {
            0.0
        }
    }
}

/// Learned merchant → category association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantMapping {
    pub key: String,
    pub preferred_category: Category,
    pub usage_count: u32,
    /// Number of times the user disagreed with the previous category
    pub category_changes: u32,
    pub amount_range: AmountRange,
    /// Categories previously assigned to this merchant, never the preferred one
    pub alternative_categories: Vec<Category>,
    pub last_updated: DateTime<Utc>,
}

impl MerchantMapping {
    fn new(key: &str, category: Category, amount: f64) -> Self {
        Self {
            key: key.to_string(),
            preferred_category: category,
            usage_count: 0,
            category_changes: 0,
            amount_range: AmountRange::new(amount),
            alternative_categories: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Confidence of this mapping for a transaction of `amount`
    pub fn confidence_for(&self, amount: f64) -> f64 {
        let mut confidence = (0.6 + self.usage_count as f64 * 0.05).min(0.95);
        if self.amount_range.contains(amount) {
            confidence += 0.1;
        }
        if self.category_changes > 2 {
            confidence -= 0.2;
        }
        clamp_confidence(confidence)
    }

    fn supersede(&mut self, category: Category) {
        if category != Category::Uncategorized
            && category != self.preferred_category
            && !self.alternative_categories.contains(&category)
        {
            self.alternative_categories.push(category);
        }
    }
}

/// Learned (token, category) association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPattern {
    pub token: String,
    pub category: Category,
    pub strength: u32,
    pub confidence: f64,
    pub amount_range: AmountRange,
    pub last_updated: DateTime<Utc>,
}

impl CategoryPattern {
    fn qualifies(&self, text: &str, amount: f64) -> bool {
        text.contains(&self.token)
            && (self.strength > STRONG_PATTERN_STRENGTH
                || self.amount_range.distance(amount) <= PATTERN_AMOUNT_SLACK)
    }
}

/// A prediction offered by the learning engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPrediction {
    pub category: Category,
    pub confidence: f64,
    pub alternatives: Vec<Category>,
    pub reason: String,
}

/// Serializable copy of the whole learning state
///
/// Persisting it is up to the caller; the engine performs no I/O.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningSnapshot {
    pub merchants: Vec<MerchantMapping>,
    pub patterns: Vec<CategoryPattern>,
}

/// Counts describing the learning state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningSummary {
    pub merchant_count: usize,
    pub pattern_count: usize,
    pub strong_pattern_count: usize,
    /// Merchants re-categorized often enough to be penalized
    pub unstable_merchant_count: usize,
}

/// Derive the merchant key: lowercase, digits and punctuation stripped, first two
/// tokens of at least two letters
pub fn merchant_key(description: &str) -> String {
    let lower = description.to_lowercase();
    let cleaned = non_alpha().replace_all(&lower, " ");
    cleaned
        .split_whitespace()
        .filter(|t| t.len() >= 2)
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens a correction teaches: words longer than three letters, then 2-4 letter
/// prefixes directly followed by `*` (kept with the asterisk)
pub fn extract_tokens(description: &str) -> Vec<String> {
    let lower = description.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();

    let cleaned = non_alpha().replace_all(&lower, " ");
    for word in cleaned.split_whitespace().filter(|w| w.len() > 3) {
        if !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }

    for caps in pos_prefix().captures_iter(&lower) {
        let prefix = format!("{}*", &caps[1]);
        if !tokens.contains(&prefix) {
            tokens.push(prefix);
        }
    }

    tokens
}

fn long_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().filter(|t| t.len() > 3)
}

/// Per-installation adaptive categorizer
#[derive(Debug, Clone, Default)]
pub struct LearningEngine {
    merchants: BTreeMap<String, MerchantMapping>,
    patterns: BTreeMap<(String, Category), CategoryPattern>,
}

impl LearningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an engine from a snapshot
    pub fn from_snapshot(snapshot: LearningSnapshot) -> Self {
        let mut engine = Self::new();
        engine.restore(snapshot);
        engine
    }

    /// Predict a category for a transaction, or `None` to defer
    pub fn predict(&self, transaction: &Transaction) -> Option<LearnedPrediction> {
        self.predict_description(&transaction.description, transaction.amount)
    }

    /// Predict from a bare description and amount
    pub fn predict_description(&self, description: &str, amount: f64) -> Option<LearnedPrediction> {
        let amount = amount.abs();
        let key = merchant_key(description);

        if let Some(mapping) = self.find_mapping(&key, description) {
            let confidence = mapping.confidence_for(amount);
            if confidence > MERCHANT_MIN_CONFIDENCE {
                debug!(
                    key = %mapping.key,
                    category = %mapping.preferred_category,
                    confidence,
                    "Merchant mapping matched"
                );
                return Some(LearnedPrediction {
                    category: mapping.preferred_category,
                    confidence,
                    alternatives: mapping.alternative_categories.clone(),
                    reason: format!(
                        "learned from {} previous categorization(s) of '{}'",
                        mapping.usage_count, mapping.key
                    ),
                });
            }
            debug!(
                key = %mapping.key,
                confidence,
                "Merchant mapping below threshold, trying patterns"
            );
        }

        self.predict_from_patterns(description, amount)
    }

    fn find_mapping(&self, key: &str, description: &str) -> Option<&MerchantMapping> {
        if key.is_empty() {
            return None;
        }
        if let Some(mapping) = self.merchants.get(key) {
            return Some(mapping);
        }

        let lower = description.to_lowercase();
        let cleaned = non_alpha().replace_all(&lower, " ");
        let words: Vec<&str> = long_tokens(&cleaned).collect();
        self.merchants.values().find(|mapping| {
            long_tokens(&mapping.key).any(|stored| {
                words
                    .iter()
                    .any(|word| stored.contains(word) || word.contains(stored))
            })
        })
    }

    fn predict_from_patterns(&self, description: &str, amount: f64) -> Option<LearnedPrediction> {
        let text = description.to_lowercase();

        let mut candidates: Vec<&CategoryPattern> = self
            .patterns
            .values()
            .filter(|p| p.qualifies(&text, amount))
            .collect();
        // Strongest first; BTreeMap order breaks the remaining ties.
        candidates.sort_by(|a, b| {
            b.strength.cmp(&a.strength).then(
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        let best = candidates.first()?;
        let mut alternatives: Vec<Category> = Vec::new();
        for other in self
            .patterns
            .values()
            .filter(|p| p.token == best.token && p.category != best.category)
        {
            if !alternatives.contains(&other.category) {
                alternatives.push(other.category);
            }
        }

        debug!(
            token = %best.token,
            category = %best.category,
            strength = best.strength,
            "Category pattern matched"
        );

        Some(LearnedPrediction {
            category: best.category,
            confidence: clamp_confidence(best.confidence),
            alternatives,
            reason: format!(
                "matches learned pattern '{}' (seen {} time(s))",
                best.token, best.strength
            ),
        })
    }

    /// Learn from a user correcting `old_category` to `new_category`
    pub fn learn_from_correction(
        &mut self,
        description: &str,
        amount: f64,
        old_category: Category,
        new_category: Category,
    ) {
        let amount = amount.abs();
        let key = merchant_key(description);

        if !key.is_empty() {
            let mapping = self
                .merchants
                .entry(key.clone())
                .or_insert_with(|| MerchantMapping::new(&key, old_category, amount));
            let prior = mapping.preferred_category;

            mapping.usage_count += 1;
            if prior != new_category && prior != Category::Uncategorized {
                mapping.category_changes += 1;
            }
            mapping.preferred_category = new_category;
            mapping.supersede(prior);
            mapping.supersede(old_category);
            mapping
                .alternative_categories
                .retain(|c| *c != new_category);
            mapping.amount_range.widen(amount);
            mapping.last_updated = Utc::now();

            debug!(
                key = %key,
                from = %old_category,
                to = %new_category,
                changes = mapping.category_changes,
                "Learned merchant correction"
            );
        }

        for token in extract_tokens(description) {
            self.strengthen_pattern(token, new_category, amount, CORRECTION_STEP, CORRECTION_CAP);
        }
    }

    /// Record that an automatic categorization was already right
    pub fn reinforce_correct_categorization(
        &mut self,
        description: &str,
        amount: f64,
        category: Category,
    ) {
        let amount = amount.abs();
        let key = merchant_key(description);

        if !key.is_empty() {
            let mapping = self
                .merchants
                .entry(key.clone())
                .or_insert_with(|| MerchantMapping::new(&key, category, amount));
            let prior = mapping.preferred_category;

            mapping.usage_count += 1;
            mapping.preferred_category = category;
            mapping.supersede(prior);
            mapping.alternative_categories.retain(|c| *c != category);
            mapping.amount_range.widen(amount);
            mapping.last_updated = Utc::now();

            debug!(key = %key, category = %category, usage = mapping.usage_count, "Reinforced merchant");
        }

        for token in extract_tokens(description) {
            self.strengthen_pattern(token, category, amount, REINFORCE_STEP, REINFORCE_CAP);
        }
    }

    fn strengthen_pattern(
        &mut self,
        token: String,
        category: Category,
        amount: f64,
        step: f64,
        cap: f64,
    ) {
        let now = Utc::now();
        self.patterns
            .entry((token.clone(), category))
            .and_modify(|p| {
                p.strength += 1;
                if p.confidence < cap {
                    p.confidence = (p.confidence + step).min(cap);
                }
                p.amount_range.widen(amount);
                p.last_updated = now;
            })
            .or_insert_with(|| CategoryPattern {
                token,
                category,
                strength: 1,
                confidence: PATTERN_INITIAL_CONFIDENCE,
                amount_range: AmountRange::new(amount),
                last_updated: now,
            });
    }

    /// Look up a merchant mapping by its exact key
    pub fn mapping(&self, key: &str) -> Option<&MerchantMapping> {
        self.merchants.get(key)
    }

    /// Look up a pattern
    pub fn pattern(&self, token: &str, category: Category) -> Option<&CategoryPattern> {
        self.patterns.get(&(token.to_string(), category))
    }

    pub fn merchants(&self) -> impl Iterator<Item = &MerchantMapping> {
        self.merchants.values()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &CategoryPattern> {
        self.patterns.values()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty() && self.patterns.is_empty()
    }

    pub fn summary(&self) -> LearningSummary {
        LearningSummary {
            merchant_count: self.merchants.len(),
            pattern_count: self.patterns.len(),
            strong_pattern_count: self
                .patterns
                .values()
                .filter(|p| p.strength > STRONG_PATTERN_STRENGTH)
                .count(),
            unstable_merchant_count: self
                .merchants
                .values()
                .filter(|m| m.category_changes > 2)
                .count(),
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.merchants.clear();
        self.patterns.clear();
    }

    pub fn snapshot(&self) -> LearningSnapshot {
        LearningSnapshot {
            merchants: self.merchants.values().cloned().collect(),
            patterns: self.patterns.values().cloned().collect(),
        }
    }

    /// Replace the current state with a snapshot
    pub fn restore(&mut self, snapshot: LearningSnapshot) {
        self.merchants = snapshot
            .merchants
            .into_iter()
            .map(|m| (m.key.clone(), m))
            .collect();
        self.patterns = snapshot
            .patterns
            .into_iter()
            .map(|p| ((p.token.clone(), p.category), p))
            .collect();
    }
}
