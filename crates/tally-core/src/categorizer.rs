//! Categorization orchestrator
//!
//! Runs a batch of transactions through the pipeline:
//!
//! 1. Financial-movement guard: rule engine movement markers (ACH, wire, ATM,
//!    transfers) force `uncategorized` no matter what later stages would say
//! 2. Remote classifier (chunked, failures are per batch and soft)
//! 3. Personal learning prediction
//! 4. Rule engine fallback, discounted by the configured penalty
//!
//! Every result is bucketed into a confidence tier; medium and low tiers go to the
//! review queue. User feedback flows back into the learning engine.
//!
//! Each mutable store (learning, review queue, stats) sits behind its own mutex,
//! and no lock is held across the remote call.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CategorizerConfig;
use crate::error::{Error, Result};
use crate::learning::{LearningEngine, LearningSnapshot, LearningSummary};
use crate::models::{
    clamp_confidence, Categorization, Category, CategorySource, ConfidenceTier, ReviewEntry,
    Transaction,
};
use crate::remote::{ClassifierBackend, ClassifierClient, RemoteOutcome};
use crate::review::ReviewQueue;
use crate::rules::{RuleEngine, RuleMatch};
use crate::stats::LearningStats;

/// Confidence given to any label the remote classifier returns
pub const REMOTE_CONFIDENCE: f64 = 0.95;

/// Confidence of a transaction the user corrected or confirmed
pub const USER_CONFIDENCE: f64 = 1.0;

/// Outcome of one categorization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// One result per input, in input order
    pub results: Vec<Categorization>,
    pub remote_count: usize,
    pub learned_count: usize,
    pub rule_count: usize,
    pub financial_movement_count: usize,
    pub no_opinion_count: usize,
    /// Entries added to the review queue by this run
    pub queued_for_review: usize,
    pub remote_batches: usize,
    pub failed_batches: usize,
    /// Set when the remote classifier degraded during the run
    pub advisory: Option<String>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Fraction of transactions that did not get a remote answer and were not
    /// financial movements
    pub fn fallback_fraction(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        (self.learned_count + self.rule_count + self.no_opinion_count) as f64
            / self.results.len() as f64
    }

    fn count(&mut self, source: CategorySource) {
        match source {
            CategorySource::Remote => self.remote_count += 1,
            CategorySource::Learned => self.learned_count += 1,
            CategorySource::Rules => self.rule_count += 1,
            CategorySource::FinancialMovement => self.financial_movement_count += 1,
            CategorySource::None => self.no_opinion_count += 1,
        }
    }
}

/// Alternatives offered next to a remote label
fn remote_alternatives(category: Category) -> Vec<Category> {
    use Category::*;
    let alternatives: &[Category] = match category {
        Groceries => &[Shopping, Dining],
        Dining => &[Groceries, Entertainment],
        Transportation => &[Utilities, Shopping],
        Entertainment => &[Shopping, Dining],
        Utilities => &[Housing, Shopping],
        Shopping => &[Groceries, Entertainment],
        Healthcare => &[Shopping, Groceries],
        Housing => &[Utilities, Shopping],
        Education => &[Shopping, Entertainment],
        Transfers => &[Housing, Utilities],
        Uncategorized => &[Shopping, Transfers],
    };
    without(alternatives, category)
}

/// Alternatives offered next to a rule fallback, by amount
fn amount_alternatives(amount: f64, category: Category) -> Vec<Category> {
    use Category::*;
    let alternatives: &[Category] = if amount > 500.0 {
        &[Housing, Utilities, Education]
    } else if amount > 100.0 {
        &[Shopping, Groceries, Utilities]
    } else if amount > 20.0 {
        &[Groceries, Dining, Shopping]
    } else {
        &[Dining, Entertainment, Transportation]
    };
    without(alternatives, category)
}

fn without(categories: &[Category], assigned: Category) -> Vec<Category> {
    categories
        .iter()
        .copied()
        .filter(|c| *c != assigned)
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The categorization pipeline
pub struct Categorizer {
    config: CategorizerConfig,
    rules: RuleEngine,
    remote: Option<ClassifierClient>,
    learning: Mutex<LearningEngine>,
    review: Mutex<ReviewQueue>,
    stats: Mutex<LearningStats>,
}

impl Categorizer {
    /// Create a categorizer with no remote classifier and empty learning state
    pub fn new(config: CategorizerConfig) -> Self {
        Self {
            config,
            rules: RuleEngine::new(),
            remote: None,
            learning: Mutex::new(LearningEngine::new()),
            review: Mutex::new(ReviewQueue::new()),
            stats: Mutex::new(LearningStats::new()),
        }
    }

    /// Use a remote classifier
    pub fn with_remote(mut self, client: ClassifierClient) -> Self {
        self.remote = Some(client);
        self
    }

    /// Start from existing learning state
    pub fn with_learning(self, engine: LearningEngine) -> Self {
        *lock(&self.learning) = engine;
        self
    }

    pub fn config(&self) -> &CategorizerConfig {
        &self.config
    }

    pub fn remote(&self) -> Option<&ClassifierClient> {
        self.remote.as_ref()
    }

    /// Categorize transactions in place
    ///
    /// Never fails: every transaction receives a category even when the remote
    /// classifier is down.
    pub async fn categorize(&self, transactions: &mut [Transaction]) -> RunSummary {
        let outcome = match &self.remote {
            Some(client) => {
                let descriptions: Vec<String> =
                    transactions.iter().map(|t| t.description.clone()).collect();
                client
                    .classify_all(&descriptions, self.config.remote.batch_size)
                    .await
            }
            None => RemoteOutcome::unavailable(transactions.len()),
        };

        let mut summary = RunSummary {
            results: Vec::with_capacity(transactions.len()),
            remote_batches: outcome.batches,
            failed_batches: outcome.failed_batches,
            ..RunSummary::default()
        };
        let mut entries = Vec::new();

        {
            let learning = lock(&self.learning);
            for (transaction, label) in transactions.iter_mut().zip(outcome.labels.iter()) {
                let result = self.categorize_one(transaction, *label, &learning);

                transaction.category = result.category;
                transaction.confidence = result.confidence;

                if let Some(priority) = result.tier.review_priority() {
                    entries.push(ReviewEntry {
                        transaction: transaction.clone(),
                        confidence: result.confidence,
                        alternatives: result.alternatives.clone(),
                        reason: result.reason.clone(),
                        priority,
                    });
                }

                summary.count(result.source);
                summary.results.push(result);
            }
        }

        summary.queued_for_review = entries.len();
        lock(&self.review).extend(entries);

        {
            let mut stats = lock(&self.stats);
            for result in &summary.results {
                stats.record(result.tier, result.source);
            }
        }

        if outcome.is_degraded() {
            let advisory = format!(
                "remote classifier failed for {} of {} batch(es); {:.0}% of transactions used local fallback",
                outcome.failed_batches,
                outcome.batches,
                summary.fallback_fraction() * 100.0
            );
            warn!(
                error = outcome.last_error.as_deref().unwrap_or("unknown"),
                "{}", advisory
            );
            summary.advisory = Some(advisory);
        }

        info!(
            total = summary.total(),
            remote = summary.remote_count,
            learned = summary.learned_count,
            rules = summary.rule_count,
            movements = summary.financial_movement_count,
            review = summary.queued_for_review,
            "Categorization run complete"
        );

        summary
    }

    fn categorize_one(
        &self,
        transaction: &Transaction,
        remote_label: Option<Category>,
        learning: &LearningEngine,
    ) -> Categorization {
        let rule = self.rules.classify(&transaction.description, transaction.amount);

        let (category, confidence, reason, alternatives, source) = match (rule, remote_label) {
            (Some(m), _) if m.is_financial_movement() => (
                Category::Uncategorized,
                m.confidence,
                format!("financial movement ({})", m.matched),
                Vec::new(),
                CategorySource::FinancialMovement,
            ),
            (_, Some(category)) => (
                category,
                REMOTE_CONFIDENCE,
                "remote classification".to_string(),
                remote_alternatives(category),
                CategorySource::Remote,
            ),
            (rule, None) => match learning.predict(transaction) {
                Some(prediction) => (
                    prediction.category,
                    prediction.confidence,
                    format!("personal learning: {}", prediction.reason),
                    without(&prediction.alternatives, prediction.category),
                    CategorySource::Learned,
                ),
                None => match rule {
                    Some(m) => self.rule_fallback(transaction, &m),
                    None => (
                        Category::Uncategorized,
                        0.0,
                        "no categorization stage had an opinion".to_string(),
                        Vec::new(),
                        CategorySource::None,
                    ),
                },
            },
        };

        let confidence = clamp_confidence(confidence);
        let tier =
            ConfidenceTier::from_confidence(confidence, self.config.tiers.high, self.config.tiers.medium);

        debug!(
            id = transaction.id,
            category = %category,
            confidence,
            source = %source,
            "Categorized transaction"
        );

        Categorization {
            transaction_id: transaction.id,
            category,
            confidence,
            reason,
            alternatives,
            source,
            tier,
        }
    }

    fn rule_fallback(
        &self,
        transaction: &Transaction,
        m: &RuleMatch,
    ) -> (Category, f64, String, Vec<Category>, CategorySource) {
        let fallback = &self.config.fallback;
        let confidence = (m.confidence - fallback.rule_penalty).max(fallback.rule_floor);
        (
            m.category,
            confidence,
            format!("rule-based fallback ({} '{}')", m.stage, m.matched),
            amount_alternatives(transaction.amount, m.category),
            CategorySource::Rules,
        )
    }

    /// Apply a user correction to a transaction and learn from it
    pub fn correct(&self, transaction: &mut Transaction, new_category: Category) {
        let old_category = transaction.category;
        transaction.category = new_category;
        transaction.confidence = USER_CONFIDENCE;

        lock(&self.review).remove(transaction.id);
        lock(&self.learning).learn_from_correction(
            &transaction.description,
            transaction.amount,
            old_category,
            new_category,
        );
        lock(&self.stats).record_correction();

        info!(
            id = transaction.id,
            from = %old_category,
            to = %new_category,
            "User corrected category"
        );
    }

    /// Record that the assigned category is right
    pub fn confirm(&self, transaction: &mut Transaction) {
        transaction.confidence = USER_CONFIDENCE;

        lock(&self.review).remove(transaction.id);
        lock(&self.learning).reinforce_correct_categorization(
            &transaction.description,
            transaction.amount,
            transaction.category,
        );
        lock(&self.stats).record_confirmation();

        info!(id = transaction.id, category = %transaction.category, "User confirmed category");
    }

    /// Correct the copy of a transaction held by the review queue
    pub fn correct_pending(&self, transaction_id: i64, new_category: Category) -> Result<Transaction> {
        let mut transaction = self.take_pending(transaction_id)?;
        self.correct(&mut transaction, new_category);
        Ok(transaction)
    }

    /// Confirm the copy of a transaction held by the review queue
    pub fn confirm_pending(&self, transaction_id: i64) -> Result<Transaction> {
        let mut transaction = self.take_pending(transaction_id)?;
        self.confirm(&mut transaction);
        Ok(transaction)
    }

    fn take_pending(&self, transaction_id: i64) -> Result<Transaction> {
        lock(&self.review)
            .remove(transaction_id)
            .map(|entry| entry.transaction)
            .ok_or_else(|| {
                Error::NotFound(format!("no review entry for transaction {}", transaction_id))
            })
    }

    /// Snapshot of the review queue, most urgent first
    pub fn review_queue(&self) -> Vec<ReviewEntry> {
        lock(&self.review).entries().to_vec()
    }

    pub fn clear_review_queue(&self) {
        lock(&self.review).clear();
    }

    pub fn stats(&self) -> LearningStats {
        lock(&self.stats).clone()
    }

    pub fn reset_stats(&self) {
        lock(&self.stats).reset();
    }

    pub fn learning_snapshot(&self) -> LearningSnapshot {
        lock(&self.learning).snapshot()
    }

    pub fn restore_learning(&self, snapshot: LearningSnapshot) {
        lock(&self.learning).restore(snapshot);
    }

    pub fn learning_summary(&self) -> LearningSummary {
        lock(&self.learning).summary()
    }

    /// Forget every learned mapping and pattern
    pub fn clear_learning(&self) {
        lock(&self.learning).clear();
        info!("Cleared personal learning state");
    }

    /// Probe the remote classifier; `None` when none is configured
    pub async fn probe_remote(&self) -> Option<bool> {
        match &self.remote {
            Some(client) => Some(client.health_check().await),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use crate::models::{Direction, ReviewPriority};
    use crate::remote::MockBackend;
    use crate::test_utils::MockClassifierServer;
    use chrono::NaiveDate;

    fn tx(id: i64, description: &str, amount: f64) -> Transaction {
        Transaction::new(
            id,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            description,
            amount,
            Direction::Expense,
        )
    }

    fn local() -> Categorizer {
        Categorizer::new(CategorizerConfig::default())
    }

    #[tokio::test]
    async fn test_random_cafe_uses_rule_fallback() {
        let categorizer = local();
        let mut txs = vec![tx(1, "RANDOM LOCAL CAFE", 6.00)];

        let summary = categorizer.categorize(&mut txs).await;

        let result = &summary.results[0];
        assert_eq!(result.source, CategorySource::Rules);
        assert!(result.reason.contains("rule-based fallback"));
        assert!(matches!(result.category, Category::Dining | Category::Shopping));
        assert!((0.25..=0.45).contains(&result.confidence));
        assert_eq!(txs[0].category, result.category);
        assert_eq!(result.tier, ConfidenceTier::Low);
        assert!(!result.alternatives.contains(&result.category));
    }

    #[tokio::test]
    async fn test_financial_movement_overrides_remote() {
        let categorizer = local().with_remote(ClassifierClient::mock());
        let mut txs = vec![tx(1, "ACH ELECTRONIC PAYMENT", 500.00)];

        let summary = categorizer.categorize(&mut txs).await;

        assert_eq!(txs[0].category, Category::Uncategorized);
        assert!((txs[0].confidence - 0.99).abs() < 1e-9);
        assert_eq!(summary.results[0].source, CategorySource::FinancialMovement);
        assert!(categorizer.review_queue().is_empty());
    }

    #[tokio::test]
    async fn test_remote_label_has_fixed_confidence() {
        let categorizer = local().with_remote(ClassifierClient::mock());
        let mut txs = vec![tx(1, "STARBUCKS #442", 5.25), tx(2, "SOMETHING OBSCURE", 12.0)];

        let summary = categorizer.categorize(&mut txs).await;

        assert_eq!(txs[0].category, Category::Dining);
        assert_eq!(summary.results[0].confidence, REMOTE_CONFIDENCE);
        assert_eq!(summary.results[0].reason, "remote classification");
        assert_eq!(
            summary.results[0].alternatives,
            vec![Category::Groceries, Category::Entertainment]
        );
        // Unrecognized vendor label still counts as a remote answer
        assert_eq!(txs[1].category, Category::Uncategorized);
        assert_eq!(summary.results[1].source, CategorySource::Remote);
        assert_eq!(summary.remote_count, 2);
        assert_eq!(summary.fallback_fraction(), 0.0);
    }

    #[tokio::test]
    async fn test_remote_failure_degrades_to_local() {
        let categorizer = local().with_remote(ClassifierClient::Mock(MockBackend::unhealthy()));
        let mut txs = vec![tx(1, "WHOLE FOODS MARKET", 84.10), tx(2, "NETFLIX.COM", 15.49)];

        let summary = categorizer.categorize(&mut txs).await;

        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.rule_count, 2);
        assert!(summary.advisory.is_some());
        assert_eq!(summary.fallback_fraction(), 1.0);
        assert_eq!(txs[0].category, Category::Groceries);
        // 0.95 - 0.2
        assert!((txs[0].confidence - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_250_transactions_three_batches_in_order() {
        let server = MockClassifierServer::start().await;
        let client = ClassifierClient::http(
            &server.endpoint(),
            MockClassifierServer::API_KEY,
            &RemoteConfig::default(),
        )
        .unwrap();
        let categorizer = local().with_remote(client);

        let mut txs: Vec<Transaction> = (0..250)
            .map(|i| {
                let description = if i % 2 == 0 { "NETFLIX.COM" } else { "TRADER JOE'S" };
                tx(i, description, 20.0)
            })
            .collect();

        let summary = categorizer.categorize(&mut txs).await;

        assert_eq!(server.batch_sizes(), vec![100, 100, 50]);
        assert_eq!(summary.total(), 250);
        for (i, (t, r)) in txs.iter().zip(summary.results.iter()).enumerate() {
            assert_eq!(t.id, i as i64);
            assert_eq!(r.transaction_id, t.id);
            let expected = if i % 2 == 0 {
                Category::Entertainment
            } else {
                Category::Groceries
            };
            assert_eq!(t.category, expected);
        }
    }

    #[tokio::test]
    async fn test_timed_out_remote_still_categorizes_everything() {
        let server = MockClassifierServer::start().await;
        server.delay_responses(std::time::Duration::from_secs(3));
        let config = RemoteConfig {
            timeout: std::time::Duration::from_secs(1),
            ..RemoteConfig::default()
        };
        let client =
            ClassifierClient::http(&server.endpoint(), MockClassifierServer::API_KEY, &config)
                .unwrap();
        let categorizer = local().with_remote(client);
        let mut txs = vec![
            tx(1, "NETFLIX.COM", 15.49),
            tx(2, "UBER EATS", 22.50),
            tx(3, "RANDOM LOCAL CAFE", 6.00),
        ];

        let summary = categorizer.categorize(&mut txs).await;

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.remote_count, 0);
        assert_eq!(summary.failed_batches, 1);
        assert!(summary.advisory.is_some());
        assert_eq!(txs[1].category, Category::Dining);
        assert!(summary
            .results
            .iter()
            .all(|r| r.source == CategorySource::Rules));
    }

    #[tokio::test]
    async fn test_restore_learning_and_clear_queue() {
        let categorizer = local();
        assert!(categorizer.remote().is_none());
        assert_eq!(categorizer.config().tiers.high, 0.90);

        let mut txs = vec![tx(1, "LOCAL BAKERY 123", 12.0), tx(2, "RANDOM LOCAL CAFE", 6.0)];
        categorizer.categorize(&mut txs).await;
        categorizer.correct(&mut txs[0], Category::Groceries);
        let snapshot = categorizer.learning_snapshot();

        categorizer.clear_learning();
        assert_eq!(categorizer.learning_summary().merchant_count, 0);
        categorizer.restore_learning(snapshot);
        assert_eq!(categorizer.learning_summary().merchant_count, 1);

        assert_eq!(categorizer.review_queue().len(), 1);
        categorizer.clear_review_queue();
        assert!(categorizer.review_queue().is_empty());

        let remote = local().with_remote(ClassifierClient::mock());
        assert_eq!(remote.remote().map(|c| c.backend_name()), Some("mock"));
    }

    #[tokio::test]
    async fn test_review_queue_ordering_after_run() {
        let categorizer = local();
        let mut txs = vec![
            tx(1, "WHOLE FOODS", 40.0),      // rules 0.75 -> medium
            tx(2, "RANDOM LOCAL CAFE", 6.0), // rules 0.30 -> low
            tx(3, "PIZZA PALACE", 18.0),     // keyword 0.82 -> 0.62 low
            tx(4, "CITY PARKING", 10.0),     // keyword 0.85 -> 0.65 low
        ];

        categorizer.categorize(&mut txs).await;
        let queue = categorizer.review_queue();

        assert_eq!(queue.len(), 4);
        let ids: Vec<i64> = queue.iter().map(|e| e.transaction.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
        assert_eq!(queue[3].priority, ReviewPriority::Medium);
    }

    #[tokio::test]
    async fn test_correction_teaches_learning_engine() {
        let categorizer = local();
        let mut txs = vec![tx(1, "LOCAL BAKERY 123", 12.0)];
        categorizer.categorize(&mut txs).await;
        assert_eq!(categorizer.review_queue().len(), 1);

        categorizer.correct(&mut txs[0], Category::Groceries);
        assert_eq!(txs[0].category, Category::Groceries);
        assert_eq!(txs[0].confidence, USER_CONFIDENCE);
        assert!(categorizer.review_queue().is_empty());

        let mut next = vec![tx(2, "LOCAL BAKERY 456", 12.0)];
        let summary = categorizer.categorize(&mut next).await;
        assert_eq!(next[0].category, Category::Groceries);
        assert_eq!(summary.results[0].source, CategorySource::Learned);
        assert!(next[0].confidence >= 0.7);

        let stats = categorizer.stats();
        assert_eq!(stats.user_corrections, 1);
        assert_eq!(stats.learned_count, 1);
    }

    #[tokio::test]
    async fn test_pending_feedback_by_id() {
        let categorizer = local();
        let mut txs = vec![tx(10, "WHOLE FOODS", 40.0), tx(11, "PIZZA PALACE", 18.0)];
        categorizer.categorize(&mut txs).await;

        let confirmed = categorizer.confirm_pending(10).unwrap();
        assert_eq!(confirmed.category, Category::Groceries);

        let corrected = categorizer.correct_pending(11, Category::Groceries).unwrap();
        assert_eq!(corrected.category, Category::Groceries);

        assert!(categorizer.review_queue().is_empty());
        assert!(matches!(
            categorizer.confirm_pending(10),
            Err(Error::NotFound(_))
        ));

        let stats = categorizer.stats();
        assert_eq!(stats.user_confirmations, 1);
        assert_eq!(stats.user_corrections, 1);
        assert!(stats.estimated_accuracy > 0.0);
    }

    #[tokio::test]
    async fn test_rerun_keeps_one_entry_per_transaction() {
        let categorizer = local();
        let mut txs = vec![tx(1, "RANDOM LOCAL CAFE", 6.0)];
        categorizer.categorize(&mut txs).await;
        categorizer.categorize(&mut txs).await;
        assert_eq!(categorizer.review_queue().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_amount_unknown_is_no_opinion() {
        let categorizer = local();
        let mut txs = vec![tx(1, "ZZZ", 0.0)];
        let summary = categorizer.categorize(&mut txs).await;
        assert_eq!(summary.results[0].source, CategorySource::None);
        assert_eq!(txs[0].category, Category::Uncategorized);
        assert_eq!(txs[0].confidence, 0.0);
    }

    #[tokio::test]
    async fn test_probe_remote() {
        assert_eq!(local().probe_remote().await, None);
        let categorizer = local().with_remote(ClassifierClient::mock());
        assert_eq!(categorizer.probe_remote().await, Some(true));
    }

    #[test]
    fn test_alternative_tables_exclude_assigned() {
        for category in Category::all() {
            assert!(!remote_alternatives(*category).contains(category));
            for amount in [5.0, 50.0, 150.0, 900.0] {
                assert!(!amount_alternatives(amount, *category).contains(category));
            }
        }
        assert_eq!(
            amount_alternatives(900.0, Category::Housing),
            vec![Category::Utilities, Category::Education]
        );
    }
}
