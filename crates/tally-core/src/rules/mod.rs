//! Deterministic rule engine for transaction categorization
//!
//! Maps a description and amount to a category and confidence by walking six
//! stages in order. The first stage with an opinion wins, and inside each stage
//! the first matching rule wins (first-match, not best-match):
//!
//! 1. Special-case overrides (financial movement, peer-to-peer, rideshare vs delivery)
//! 2. Exact merchant names
//! 3. Context-aware services (e-commerce vs streaming, video, app stores)
//! 4. Generic keywords
//! 5. Patterns (movement language, small subscriptions, POS prefixes, leases)
//! 6. Smart default by amount bucket
//!
//! Matching is case-insensitive sub-string containment. A merchant string hidden
//! inside an unrelated longer word still matches; the only exception is the
//! short movement tokens in [`tables::MOVEMENT_WORDS`], which must stand alone.

pub mod tables;

use serde::{Deserialize, Serialize};

use crate::models::Category;

use tables::*;

/// Stage of the rule engine that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStage {
    SpecialCase,
    ExactMerchant,
    ContextService,
    Keyword,
    Pattern,
    SmartDefault,
}

impl RuleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecialCase => "special_case",
            Self::ExactMerchant => "exact_merchant",
            Self::ContextService => "context_service",
            Self::Keyword => "keyword",
            Self::Pattern => "pattern",
            Self::SmartDefault => "smart_default",
        }
    }
}

impl std::fmt::Display for RuleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rule engine match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub category: Category,
    pub confidence: f64,
    pub stage: RuleStage,
    /// The table entry that fired (e.g. "whole foods", "tst*", "amount>=1000")
    pub matched: String,
}

impl RuleMatch {
    fn new(category: Category, confidence: f64, stage: RuleStage, matched: &str) -> Self {
        Self {
            category,
            confidence,
            stage,
            matched: matched.to_string(),
        }
    }

    /// Whether this match deliberately parks a money movement in `uncategorized`
    pub fn is_financial_movement(&self) -> bool {
        self.category == Category::Uncategorized
            && matches!(self.stage, RuleStage::SpecialCase | RuleStage::Pattern)
    }
}

/// Stateless rule engine over the static tables
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classify a description, returning `None` when no stage has an opinion
    pub fn classify(&self, description: &str, amount: f64) -> Option<RuleMatch> {
        let text = description.to_lowercase();
        let amount = amount.abs();

        special_case(&text)
            .or_else(|| exact_merchant(&text))
            .or_else(|| context_service(&text))
            .or_else(|| keyword(&text))
            .or_else(|| pattern(&text, amount))
            .or_else(|| smart_default(amount))
    }

    /// Classify, collapsing "no opinion" into `(uncategorized, 0.0)`
    pub fn categorize(&self, description: &str, amount: f64) -> (Category, f64) {
        self.classify(description, amount)
            .map(|m| (m.category, m.confidence))
            .unwrap_or((Category::Uncategorized, 0.0))
    }
}

fn find_term<'a>(text: &str, terms: &[&'a str]) -> Option<&'a str> {
    terms.iter().copied().find(|t| text.contains(t))
}

/// Whole-word match; bank forms that glue a terminal number or a `w` (as in
/// "ATM0042" or "ATMW/D") onto the word also count
fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|token| {
        token.strip_prefix(word).is_some_and(|rest| {
            rest.chars().all(|c| c.is_ascii_digit()) || rest == "w"
        })
    })
}

fn special_case(text: &str) -> Option<RuleMatch> {
    // Movement markers first: "venmo wire transfer" must never become a guess.
    if let Some(marker) = find_term(text, FINANCIAL_MOVEMENT_MARKERS) {
        return Some(RuleMatch::new(
            Category::Uncategorized,
            0.99,
            RuleStage::SpecialCase,
            marker,
        ));
    }

    if let Some(marker) = find_term(text, P2P_MARKERS) {
        return Some(RuleMatch::new(
            Category::Transfers,
            0.92,
            RuleStage::SpecialCase,
            marker,
        ));
    }

    if text.contains(RIDESHARE_BRAND) {
        if let Some(sub) = find_term(text, DELIVERY_SUBTOKENS) {
            return Some(RuleMatch::new(
                Category::Dining,
                0.96,
                RuleStage::SpecialCase,
                sub,
            ));
        }
        return Some(RuleMatch::new(
            Category::Transportation,
            0.94,
            RuleStage::SpecialCase,
            RIDESHARE_BRAND,
        ));
    }

    None
}

fn exact_merchant(text: &str) -> Option<RuleMatch> {
    MERCHANTS.iter().find_map(|(category, merchants)| {
        find_term(text, merchants)
            .map(|m| RuleMatch::new(*category, 0.95, RuleStage::ExactMerchant, m))
    })
}

fn context_service(text: &str) -> Option<RuleMatch> {
    if let Some(brand) = find_term(text, ECOMMERCE_BRANDS) {
        if let Some(term) = find_term(text, ECOMMERCE_MEDIA_TERMS) {
            return Some(RuleMatch::new(
                Category::Entertainment,
                0.88,
                RuleStage::ContextService,
                term,
            ));
        }
        return Some(RuleMatch::new(
            Category::Shopping,
            0.90,
            RuleStage::ContextService,
            brand,
        ));
    }

    if text.contains(VIDEO_BRAND) {
        let confidence = if find_term(text, VIDEO_PREMIUM_TERMS).is_some() {
            0.92
        } else {
            0.85
        };
        return Some(RuleMatch::new(
            Category::Entertainment,
            confidence,
            RuleStage::ContextService,
            VIDEO_BRAND,
        ));
    }

    if text.contains(APPLE_BRAND) {
        if let Some(term) = find_term(text, APPLE_MEDIA_TERMS) {
            return Some(RuleMatch::new(
                Category::Entertainment,
                0.90,
                RuleStage::ContextService,
                term,
            ));
        }
        if let Some(term) = find_term(text, APPLE_RETAIL_TERMS) {
            return Some(RuleMatch::new(
                Category::Shopping,
                0.90,
                RuleStage::ContextService,
                term,
            ));
        }
    }

    if text.contains(GOOGLE_BRAND) {
        if let Some(term) = find_term(text, GOOGLE_STORAGE_TERMS) {
            return Some(RuleMatch::new(
                Category::Utilities,
                0.87,
                RuleStage::ContextService,
                term,
            ));
        }
        if let Some(term) = find_term(text, GOOGLE_MEDIA_TERMS) {
            return Some(RuleMatch::new(
                Category::Entertainment,
                0.86,
                RuleStage::ContextService,
                term,
            ));
        }
    }

    None
}

fn keyword(text: &str) -> Option<RuleMatch> {
    KEYWORDS.iter().find_map(|(category, confidence, words)| {
        find_term(text, words).map(|w| RuleMatch::new(*category, *confidence, RuleStage::Keyword, w))
    })
}

fn pattern(text: &str, amount: f64) -> Option<RuleMatch> {
    if let Some(phrase) = find_term(text, MOVEMENT_PHRASES) {
        return Some(RuleMatch::new(
            Category::Uncategorized,
            0.95,
            RuleStage::Pattern,
            phrase,
        ));
    }
    if let Some(word) = MOVEMENT_WORDS.iter().copied().find(|w| has_word(text, w)) {
        return Some(RuleMatch::new(
            Category::Uncategorized,
            0.95,
            RuleStage::Pattern,
            word,
        ));
    }

    if amount <= SUBSCRIPTION_MAX_AMOUNT {
        if let Some(term) = find_term(text, SUBSCRIPTION_TERMS) {
            let (category, confidence) = if find_term(text, SUBSCRIPTION_MEDIA_TERMS).is_some() {
                (Category::Entertainment, 0.80)
            } else if find_term(text, SUBSCRIPTION_SERVICE_TERMS).is_some() {
                (Category::Utilities, 0.78)
            } else if find_term(text, SUBSCRIPTION_FITNESS_TERMS).is_some() {
                (Category::Healthcare, 0.70)
            } else {
                (Category::Entertainment, 0.65)
            };
            return Some(RuleMatch::new(category, confidence, RuleStage::Pattern, term));
        }
    }

    let trimmed = text.trim_start();
    if let Some((prefix, category, confidence)) = POS_PREFIXES
        .iter()
        .find(|(prefix, _, _)| trimmed.starts_with(prefix))
    {
        return Some(RuleMatch::new(
            *category,
            *confidence,
            RuleStage::Pattern,
            prefix,
        ));
    }

    if amount >= LEASE_MIN_AMOUNT {
        if let Some(term) = find_term(text, LEASE_TERMS) {
            return Some(RuleMatch::new(
                Category::Housing,
                0.70,
                RuleStage::Pattern,
                term,
            ));
        }
    }

    None
}

fn smart_default(amount: f64) -> Option<RuleMatch> {
    AMOUNT_BUCKETS
        .iter()
        .find(|(min, _, _)| amount >= *min)
        .map(|(min, category, confidence)| {
            RuleMatch::new(
                *category,
                *confidence,
                RuleStage::SmartDefault,
                &format!("amount>={}", min),
            )
        })
}
