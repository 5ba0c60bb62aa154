//! Domain models for Tally

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spending category assigned to a transaction
///
/// Closed set. `Uncategorized` doubles as the "no opinion" value and as the
/// deliberate target for financial movements (ATM, wire, internal transfer).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Groceries,
    Utilities,
    Entertainment,
    Transportation,
    Dining,
    Shopping,
    Healthcare,
    Housing,
    Education,
    Transfers,
    #[default]
    Uncategorized,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "groceries",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Transportation => "transportation",
            Self::Dining => "dining",
            Self::Shopping => "shopping",
            Self::Healthcare => "healthcare",
            Self::Housing => "housing",
            Self::Education => "education",
            Self::Transfers => "transfers",
            Self::Uncategorized => "uncategorized",
        }
    }

    /// Get all categories, in declaration order
    pub fn all() -> &'static [Category] {
        &[
            Self::Groceries,
            Self::Utilities,
            Self::Entertainment,
            Self::Transportation,
            Self::Dining,
            Self::Shopping,
            Self::Healthcare,
            Self::Housing,
            Self::Education,
            Self::Transfers,
            Self::Uncategorized,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groceries" => Ok(Self::Groceries),
            "utilities" => Ok(Self::Utilities),
            "entertainment" => Ok(Self::Entertainment),
            "transportation" => Ok(Self::Transportation),
            "dining" => Ok(Self::Dining),
            "shopping" => Ok(Self::Shopping),
            "healthcare" => Ok(Self::Healthcare),
            "housing" => Ok(Self::Housing),
            "education" => Ok(Self::Education),
            "transfers" => Ok(Self::Transfers),
            "uncategorized" => Ok(Self::Uncategorized),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    #[default]
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "credit" => Ok(Self::Income),
            "expense" | "debit" => Ok(Self::Expense),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank transaction flowing through the pipeline
///
/// `id`, `date`, `description`, `amount` and `direction` are set by the import
/// collaborator. Only the pipeline or an explicit user correction touches
/// `category` and `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Non-negative magnitude
    pub amount: f64,
    pub direction: Direction,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub confidence: f64,
}

impl Transaction {
    /// Create an uncategorized transaction
    pub fn new(
        id: i64,
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            date,
            description: description.into(),
            amount: amount.abs(),
            direction,
            category: Category::Uncategorized,
            confidence: 0.0,
        }
    }
}

/// Which stage of the pipeline produced a categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Remote classification API
    Remote,
    /// Personal learning (user corrections and confirmations)
    Learned,
    /// Local rule engine used as a fallback
    Rules,
    /// Forced `uncategorized` for ATM/wire/ACH style movements
    FinancialMovement,
    /// Nothing produced an opinion
    None,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Learned => "learned",
            Self::Rules => "rules",
            Self::FinancialMovement => "financial_movement",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence bucket driving auto-accept vs review placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// >= 0.90: auto-accepted, never reviewed
    High,
    /// [0.70, 0.90): auto-accepted, queued with medium priority
    Medium,
    /// < 0.70: auto-accepted, queued with high priority
    Low,
}

impl ConfidenceTier {
    /// Bucket a confidence score using the given thresholds
    pub fn from_confidence(confidence: f64, high: f64, medium: f64) -> Self {
        if confidence >= high {
            Self::High
        } else if confidence >= medium {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Review priority for this tier (None for auto-accepted high tier)
    pub fn review_priority(&self) -> Option<ReviewPriority> {
        match self {
            Self::High => None,
            Self::Medium => Some(ReviewPriority::Medium),
            Self::Low => Some(ReviewPriority::High),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Priority of a review queue entry
///
/// Ordering is "most urgent first": `High < Medium`, so an ascending sort puts
/// high-priority entries at the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewPriority {
    High,
    Medium,
}

impl ReviewPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

impl std::fmt::Display for ReviewPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-transaction output of a categorization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub transaction_id: i64,
    pub category: Category,
    pub confidence: f64,
    pub reason: String,
    /// Other plausible categories, never containing `category`
    pub alternatives: Vec<Category>,
    pub source: CategorySource,
    pub tier: ConfidenceTier,
}

/// A categorized transaction awaiting user confirmation or correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub transaction: Transaction,
    pub confidence: f64,
    pub alternatives: Vec<Category>,
    pub reason: String,
    pub priority: ReviewPriority,
}

/// Clamp a confidence into [0, 1]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
