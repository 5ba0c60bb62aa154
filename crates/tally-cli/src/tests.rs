//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::Path;

use tally_core::test_utils::MockClassifierServer;
use tally_core::{Category, CategorizerConfig, ClassifierClient, Direction, RemoteConfig};

use crate::commands::{self, truncate, InputFormat};

const STATEMENT_CSV: &str = "\
date,description,amount
2024-03-01,UBER EATS PENDING,-22.50
03/02/2024,\"WHOLEFDS MKT #10234\",\"-1,084.12\"
03/03/24,ACME CORP PAYROLL,2500.00
2024-03-04,ATM WITHDRAWAL 0042,-100.00
";

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ========== Input Parsing Tests ==========

#[test]
fn test_parse_csv_sign_decides_direction() {
    let txs = commands::parse_csv_transactions(STATEMENT_CSV.as_bytes()).unwrap();

    assert_eq!(txs.len(), 4);
    assert_eq!(txs[0].id, 1);
    assert_eq!(txs[3].id, 4);

    assert_eq!(txs[0].direction, Direction::Expense);
    assert_eq!(txs[0].amount, 22.50);
    assert_eq!(txs[1].amount, 1084.12);
    assert_eq!(txs[2].direction, Direction::Income);
    assert_eq!(txs[2].date.to_string(), "2024-03-03");
    assert!(txs.iter().all(|t| t.category == Category::Uncategorized));
}

#[test]
fn test_parse_csv_explicit_direction_column() {
    let csv = "date,description,amount,direction\n\
               2024-03-01,REFUND AMAZON,15.00,credit\n\
               2024-03-02,SHELL OIL 5512,40.00,expense\n";
    let txs = commands::parse_csv_transactions(csv.as_bytes()).unwrap();

    assert_eq!(txs[0].direction, Direction::Income);
    assert_eq!(txs[1].direction, Direction::Expense);
}

#[test]
fn test_parse_csv_reports_bad_row() {
    let csv = "date,description,amount\n2024-03-01,OK,1.00\nyesterday,BAD,2.00\n";
    let err = commands::parse_csv_transactions(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("Row 3"));

    let csv = "date,description,amount\n2024-03-01,NO AMOUNT,abc\n";
    assert!(commands::parse_csv_transactions(csv.as_bytes()).is_err());
}

#[test]
fn test_detect_format() {
    assert_eq!(
        commands::detect_format(Path::new("a.CSV"), None).unwrap(),
        InputFormat::Csv
    );
    assert_eq!(
        commands::detect_format(Path::new("a.txt"), Some("json")).unwrap(),
        InputFormat::Json
    );
    assert!(commands::detect_format(Path::new("a.xlsx"), None).is_err());
    assert!(commands::detect_format(Path::new("statement"), None).is_err());
}

#[test]
fn test_read_json_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "txs.json",
        r#"[
            {"id": 7, "date": "2024-03-01", "description": "NETFLIX.COM", "amount": -15.49, "direction": "expense"}
        ]"#,
    );

    let txs = commands::read_transactions(&path, InputFormat::Json).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].id, 7);
    assert_eq!(txs[0].amount, 15.49);
    assert_eq!(txs[0].confidence, 0.0);
}

// ========== Categorize Command Tests ==========

#[tokio::test]
async fn test_cmd_categorize_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "statement.csv", STATEMENT_CSV);
    let output = dir.path().join("out.json");
    let learning_file = commands::learning_path(dir.path());

    commands::cmd_categorize(
        &input,
        None,
        Some(&output),
        CategorizerConfig::default(),
        None,
        &learning_file,
        true,
    )
    .await
    .unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let transactions = document["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 4);
    assert_eq!(transactions[0]["category"], "dining");
    assert_eq!(transactions[3]["category"], "uncategorized");
    assert_eq!(document["summary"]["financial_movement_count"], 1);

    // Categorizing alone does not create learning state
    assert!(!learning_file.exists());
}

#[tokio::test]
async fn test_cmd_categorize_uses_learning_state() {
    let dir = tempfile::tempdir().unwrap();
    let learning_file = commands::learning_path(dir.path());
    commands::cmd_learn_correct(
        &learning_file,
        "CORNER NOODLE HOUSE 17",
        21.00,
        Category::Dining,
        None,
    )
    .unwrap();

    let input = write_file(
        dir.path(),
        "statement.csv",
        "date,description,amount\n2024-03-05,CORNER NOODLE HOUSE 99,-21.00\n",
    );
    let output = dir.path().join("out.json");

    commands::cmd_categorize(
        &input,
        None,
        Some(&output),
        CategorizerConfig::default(),
        None,
        &learning_file,
        false,
    )
    .await
    .unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(document["transactions"][0]["category"], "dining");
    assert_eq!(document["summary"]["results"][0]["source"], "learned");
}

#[tokio::test]
async fn test_cmd_categorize_with_remote_server() {
    let server = MockClassifierServer::start().await;
    let client = ClassifierClient::http(
        &server.endpoint(),
        MockClassifierServer::API_KEY,
        &RemoteConfig::default(),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "statement.csv", STATEMENT_CSV);
    let output = dir.path().join("out.json");

    commands::cmd_categorize(
        &input,
        None,
        Some(&output),
        CategorizerConfig::default(),
        Some(client),
        &commands::learning_path(dir.path()),
        false,
    )
    .await
    .unwrap();

    assert_eq!(server.batch_sizes(), vec![4]);
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(document["transactions"][0]["category"], "dining");
    assert!(document["summary"]["advisory"].is_null());
}

#[tokio::test]
async fn test_cmd_categorize_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = commands::cmd_categorize(
        &dir.path().join("missing.csv"),
        None,
        None,
        CategorizerConfig::default(),
        None,
        &commands::learning_path(dir.path()),
        false,
    )
    .await;
    assert!(result.is_err());
}

// ========== Learn Command Tests ==========

#[test]
fn test_cmd_learn_correct_persists() {
    let dir = tempfile::tempdir().unwrap();
    let learning_file = commands::learning_path(dir.path());

    commands::cmd_learn_correct(
        &learning_file,
        "GREENVIEW PROPERTY LEASE",
        1450.00,
        Category::Housing,
        Some(Category::Uncategorized),
    )
    .unwrap();

    let engine = commands::load_learning(&learning_file).unwrap();
    let mapping = engine.mapping("greenview property").unwrap();
    assert_eq!(mapping.preferred_category, Category::Housing);
    assert_eq!(mapping.usage_count, 1);
    assert_eq!(mapping.category_changes, 0);
}

#[test]
fn test_cmd_learn_confirm_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let learning_file = commands::learning_path(dir.path());

    commands::cmd_learn_confirm(&learning_file, "NETFLIX.COM", 15.49, Category::Entertainment)
        .unwrap();
    commands::cmd_learn_confirm(&learning_file, "NETFLIX.COM", 15.49, Category::Entertainment)
        .unwrap();

    let engine = commands::load_learning(&learning_file).unwrap();
    assert_eq!(engine.summary().merchant_count, 1);

    assert!(commands::cmd_learn_show(&learning_file, 5).is_ok());
    assert!(commands::cmd_learn_predict(&learning_file, "NETFLIX.COM", 15.49).is_ok());
}

#[test]
fn test_cmd_learn_show_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::cmd_learn_show(&commands::learning_path(dir.path()), 20).is_ok());
}

#[test]
fn test_cmd_learn_clear() {
    let dir = tempfile::tempdir().unwrap();
    let learning_file = commands::learning_path(dir.path());
    commands::cmd_learn_correct(&learning_file, "CORNER CAFE", 6.0, Category::Dining, None)
        .unwrap();

    commands::cmd_learn_clear(&learning_file, true).unwrap();

    let engine = commands::load_learning(&learning_file).unwrap();
    assert!(engine.is_empty());
}

#[test]
fn test_load_learning_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "learning.json", "not json");
    assert!(commands::load_learning(&path).is_err());
}

#[test]
fn test_learning_file_uses_override_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = commands::learning_file(Some(dir.path())).unwrap();
    assert_eq!(path, dir.path().join(commands::LEARNING_FILE));
}

#[test]
fn test_parse_category() {
    assert_eq!(commands::parse_category("Dining").unwrap(), Category::Dining);

    let err = commands::parse_category("snacks").unwrap_err().to_string();
    assert!(err.contains("snacks"));
    assert!(err.contains("groceries"));
}

// ========== Rules / Remote / Config Command Tests ==========

#[test]
fn test_cmd_rules_test() {
    assert!(commands::cmd_rules_test("UBER EATS", 22.50).is_ok());
    assert!(commands::cmd_rules_test("ACH ELECTRONIC PAYMENT", 500.0).is_ok());
    assert!(commands::cmd_rules_test("", 0.0).is_ok());
}

#[tokio::test]
async fn test_cmd_remote_probe() {
    assert!(!commands::cmd_remote_probe(None).await.unwrap());

    let server = MockClassifierServer::start().await;
    let client = ClassifierClient::http(
        &server.endpoint(),
        MockClassifierServer::API_KEY,
        &RemoteConfig::default(),
    )
    .unwrap();
    assert!(commands::cmd_remote_probe(Some(client.clone())).await.unwrap());
    assert_eq!(server.batch_sizes(), vec![2]);

    server.fail_all(true);
    assert!(!commands::cmd_remote_probe(Some(client)).await.unwrap());
}

#[test]
fn test_load_config_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "categorizer.toml", "[tiers]\nhigh = 0.95\n");

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.tiers.high, 0.95);
    assert_eq!(config.tiers.medium, 0.70);

    let bad = write_file(dir.path(), "bad.toml", "[remote]\nbatch_size = 500\n");
    assert!(commands::load_config(Some(&bad)).is_err());
}

#[test]
fn test_config_commands() {
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::cmd_config_show(&CategorizerConfig::default()).is_ok());
    assert!(commands::cmd_config_path(None, &commands::learning_path(dir.path())).is_ok());
    assert!(commands::cmd_config_default().is_ok());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long string", 10), "this is...");
    assert_eq!(truncate("café crème brûlée", 8), "café ...");
}
