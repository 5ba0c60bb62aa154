//! Integration tests for tally-core
//!
//! These tests exercise the full categorize → review → feedback → learn workflow.

use chrono::NaiveDate;
use tally_core::{
    Categorizer, CategorizerConfig, Category, CategorySource, ClassifierClient, ConfidenceTier,
    Direction, LearningEngine, LearningSnapshot, MockBackend, ReviewPriority, RuleEngine,
    Transaction,
};

fn tx(id: i64, description: &str, amount: f64) -> Transaction {
    Transaction::new(
        id,
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        description,
        amount,
        Direction::Expense,
    )
}

/// A month of typical statement lines
fn statement() -> Vec<Transaction> {
    vec![
        tx(1, "WHOLEFDS MKT #10234", 84.12),
        tx(2, "UBER EATS PENDING", 22.50),
        tx(3, "UBER *TRIP HELP.UBER.COM", 14.20),
        tx(4, "ACH ELECTRONIC PAYMENT", 500.00),
        tx(5, "NETFLIX.COM", 15.49),
        tx(6, "RANDOM LOCAL CAFE", 6.00),
        tx(7, "TST* JOES NOODLE BAR", 18.75),
        tx(8, "ZELLE TO J SMITH", 60.00),
        tx(9, "ATM WITHDRAWAL 0042", 100.00),
        tx(10, "GREENVIEW PROPERTY LEASE", 1450.00),
    ]
}

// =============================================================================
// Rule Engine
// =============================================================================

#[test]
fn test_rule_engine_reference_examples() {
    let rules = RuleEngine::new();

    let (category, confidence) = rules.categorize("UBER EATS", 22.50);
    assert_eq!(category, Category::Dining);
    assert!((confidence - 0.96).abs() < 1e-9);

    let (category, confidence) = rules.categorize("ACH ELECTRONIC PAYMENT", 500.00);
    assert_eq!(category, Category::Uncategorized);
    assert!((confidence - 0.99).abs() < 1e-9);

    let (category, confidence) = rules.categorize("RANDOM LOCAL CAFE", 6.00);
    assert!(matches!(category, Category::Dining | Category::Shopping));
    assert!((0.25..=0.45).contains(&confidence));
}

// =============================================================================
// Local-only pipeline
// =============================================================================

#[tokio::test]
async fn test_every_transaction_gets_a_valid_category() {
    let categorizer = Categorizer::new(CategorizerConfig::default());
    let mut txs = statement();

    let summary = categorizer.categorize(&mut txs).await;

    assert_eq!(summary.total(), txs.len());
    for (t, r) in txs.iter().zip(summary.results.iter()) {
        assert_eq!(t.category, r.category);
        assert!((0.0..=1.0).contains(&t.confidence));
        assert!(!r.alternatives.contains(&r.category));
    }

    // Financial movements never become a guess
    for id in [4, 9] {
        let t = txs.iter().find(|t| t.id == id).unwrap();
        assert_eq!(t.category, Category::Uncategorized);
        assert!(t.confidence >= 0.95);
    }
    assert_eq!(summary.financial_movement_count, 2);
}

#[tokio::test]
async fn test_review_queue_is_sorted_and_unique() {
    let categorizer = Categorizer::new(CategorizerConfig::default());
    let mut txs = statement();
    categorizer.categorize(&mut txs).await;
    categorizer.categorize(&mut txs).await;

    let queue = categorizer.review_queue();
    assert!(!queue.is_empty());

    let mut ids: Vec<i64> = queue.iter().map(|e| e.transaction.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), queue.len());

    for pair in queue.windows(2) {
        assert!(pair[0].priority <= pair[1].priority);
        if pair[0].priority == pair[1].priority {
            assert!(pair[0].confidence <= pair[1].confidence);
        }
    }
    assert!(queue.iter().all(|e| e.confidence < 0.90));
    assert_eq!(queue[0].priority, ReviewPriority::High);
}

// =============================================================================
// Remote classifier
// =============================================================================

#[tokio::test]
async fn test_mock_remote_pipeline() {
    let categorizer =
        Categorizer::new(CategorizerConfig::default()).with_remote(ClassifierClient::mock());
    let mut txs = statement();

    let summary = categorizer.categorize(&mut txs).await;

    let netflix = &summary.results[4];
    assert_eq!(netflix.category, Category::Entertainment);
    assert_eq!(netflix.source, CategorySource::Remote);
    assert_eq!(netflix.confidence, 0.95);
    assert_eq!(netflix.tier, ConfidenceTier::High);
    assert!(summary.advisory.is_none());
    assert_eq!(summary.remote_batches, 1);
}

#[tokio::test]
async fn test_remote_outage_still_categorizes_everything() {
    let categorizer = Categorizer::new(CategorizerConfig::default())
        .with_remote(ClassifierClient::Mock(MockBackend::unhealthy()));
    let mut txs = statement();

    let summary = categorizer.categorize(&mut txs).await;

    assert_eq!(summary.total(), txs.len());
    assert_eq!(summary.remote_count, 0);
    assert_eq!(summary.failed_batches, 1);
    let advisory = summary
        .advisory
        .as_deref()
        .expect("degraded run reports an advisory");
    assert!(advisory.contains("local fallback"));
    assert!(summary.fallback_fraction() > 0.5);
}

// =============================================================================
// Feedback and learning
// =============================================================================

#[tokio::test]
async fn test_corrections_survive_snapshot_round_trip() {
    let categorizer = Categorizer::new(CategorizerConfig::default());
    let mut txs = vec![tx(1, "CORNER NOODLE HOUSE 17", 21.00)];
    categorizer.categorize(&mut txs).await;
    categorizer.correct(&mut txs[0], Category::Dining);

    // Persist through a file the way a store collaborator would
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.json");
    let json = serde_json::to_string_pretty(&categorizer.learning_snapshot()).unwrap();
    std::fs::write(&path, json).unwrap();

    let restored: LearningSnapshot =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let fresh = Categorizer::new(CategorizerConfig::default())
        .with_learning(LearningEngine::from_snapshot(restored));

    let mut next = vec![tx(2, "CORNER NOODLE HOUSE 99", 21.00)];
    let summary = fresh.categorize(&mut next).await;
    assert_eq!(next[0].category, Category::Dining);
    assert_eq!(summary.results[0].source, CategorySource::Learned);
}

#[tokio::test]
async fn test_clear_learning_forgets() {
    let categorizer = Categorizer::new(CategorizerConfig::default());
    let mut t = tx(1, "CORNER NOODLE HOUSE", 21.00);
    categorizer.correct(&mut t, Category::Dining);
    assert_eq!(categorizer.learning_summary().merchant_count, 1);

    categorizer.clear_learning();
    assert_eq!(categorizer.learning_summary().merchant_count, 0);
    assert_eq!(categorizer.learning_summary().pattern_count, 0);
}

#[tokio::test]
async fn test_stats_accumulate_across_runs() {
    let categorizer = Categorizer::new(CategorizerConfig::default());
    let mut first = statement();
    let mut second = statement();
    categorizer.categorize(&mut first).await;
    categorizer.categorize(&mut second).await;

    let stats = categorizer.stats();
    assert_eq!(stats.total_processed, 20);
    assert_eq!(
        stats.high_confidence + stats.medium_confidence + stats.low_confidence,
        20
    );
    assert!(stats.estimated_accuracy > 0.0 && stats.estimated_accuracy <= 1.0);

    categorizer.reset_stats();
    assert_eq!(categorizer.stats().total_processed, 0);
}
