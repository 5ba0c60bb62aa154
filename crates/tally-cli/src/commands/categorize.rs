//! Categorize command
//!
//! Reads one fixed input layout:
//! - CSV with a header row: `date,description,amount[,direction]`
//! - JSON: an array of transaction objects
//!
//! Without a direction column the sign of the amount decides: negative is an
//! expense, positive is income.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use tally_core::{
    Categorizer, CategorizerConfig, ClassifierBackend, ClassifierClient, Direction, RunSummary,
    Transaction,
};

use super::core::load_learning;
use super::truncate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

/// Pick the input format from an explicit flag or the file extension
pub fn detect_format(path: &Path, explicit: Option<&str>) -> Result<InputFormat> {
    let name = match explicit {
        Some(format) => format.to_lowercase(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default(),
    };

    match name.as_str() {
        "csv" => Ok(InputFormat::Csv),
        "json" => Ok(InputFormat::Json),
        "" => bail!("Cannot infer input format for {}; pass --format", path.display()),
        other => bail!("Unsupported input format: {} (use csv or json)", other),
    }
}

pub fn read_transactions(path: &Path, format: InputFormat) -> Result<Vec<Transaction>> {
    match format {
        InputFormat::Csv => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            parse_csv_transactions(file)
        }
        InputFormat::Json => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut transactions: Vec<Transaction> =
                serde_json::from_str(&content).context("Invalid transaction JSON")?;
            for tx in &mut transactions {
                tx.amount = tx.amount.abs();
            }
            Ok(transactions)
        }
    }
}

/// Parse `date,description,amount[,direction]` rows; ids are 1-based row numbers
pub fn parse_csv_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 2; // header is line 1

        let date = parse_date(record.get(0).unwrap_or_default())
            .with_context(|| format!("Row {}: bad date", row))?;
        let description = record.get(1).unwrap_or_default().to_string();
        if description.is_empty() {
            bail!("Row {}: missing description", row);
        }
        let amount = parse_amount(record.get(2).unwrap_or_default())
            .with_context(|| format!("Row {}: bad amount", row))?;

        let direction = match record.get(3).filter(|s| !s.is_empty()) {
            Some(value) => value
                .parse::<Direction>()
                .map_err(|e| anyhow::anyhow!("Row {}: {}", row, e))?,
            None if amount < 0.0 => Direction::Expense,
            None => Direction::Income,
        };

        transactions.push(Transaction::new(
            (index + 1) as i64,
            date,
            description,
            amount,
            direction,
        ));
    }

    tracing::debug!("Parsed {} transactions", transactions.len());
    Ok(transactions)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    // Two-digit years first; %Y would read "24" as year 24
    let formats = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    bail!("Unable to parse date: {}", s)
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .with_context(|| format!("Unable to parse amount: {}", s))
}

/// Categorize a transaction file
pub async fn cmd_categorize(
    file: &Path,
    format: Option<&str>,
    output: Option<&Path>,
    config: CategorizerConfig,
    remote: Option<ClassifierClient>,
    learning_file: &Path,
    show_review: bool,
) -> Result<()> {
    let format = detect_format(file, format)?;
    let mut transactions = read_transactions(file, format)?;
    println!(
        "📥 Read {} transactions from {}",
        transactions.len(),
        file.display()
    );

    let mut categorizer = Categorizer::new(config).with_learning(load_learning(learning_file)?);
    match remote {
        Some(client) => {
            println!("   🌐 Remote classifier: {} ({})", client.host(), client.backend_name());
            categorizer = categorizer.with_remote(client);
        }
        None => {
            println!("   💡 Tip: Set TALLY_CLASSIFIER_URL and TALLY_CLASSIFIER_API_KEY for remote classification");
        }
    }

    let summary = categorizer.categorize(&mut transactions).await;

    println!();
    println!(
        "{:<4} {:<36} {:>10} {:<15} {:>5} {:<18}",
        "ID", "Description", "Amount", "Category", "Conf", "Source"
    );
    println!("{}", "─".repeat(94));
    for (tx, result) in transactions.iter().zip(summary.results.iter()) {
        println!(
            "{:<4} {:<36} {:>10.2} {:<15} {:>5.2} {:<18}",
            tx.id,
            truncate(&tx.description, 36),
            tx.amount,
            result.category.as_str(),
            result.confidence,
            result.source.as_str(),
        );
    }

    print_summary(&summary);

    if show_review {
        let queue = categorizer.review_queue();
        println!();
        println!("📝 Review queue ({} entries)", queue.len());
        for entry in &queue {
            let alternatives: Vec<&str> = entry.alternatives.iter().map(|c| c.as_str()).collect();
            println!(
                "   [{}] #{} {} → {} ({:.2}) alt: {}",
                entry.priority,
                entry.transaction.id,
                truncate(&entry.transaction.description, 30),
                entry.transaction.category,
                entry.confidence,
                alternatives.join(", ")
            );
            println!("        {}", entry.reason);
        }
    }

    if let Some(path) = output {
        let document = serde_json::json!({
            "transactions": transactions,
            "summary": summary,
        });
        fs::write(path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!();
        println!("💾 Wrote results to {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 Run summary");
    println!("   ─────────────────────────────");
    println!("   Total:               {}", summary.total());
    println!("   Remote:              {}", summary.remote_count);
    println!("   Personal learning:   {}", summary.learned_count);
    println!("   Rule fallback:       {}", summary.rule_count);
    println!("   Financial movements: {}", summary.financial_movement_count);
    println!("   No opinion:          {}", summary.no_opinion_count);
    println!("   Queued for review:   {}", summary.queued_for_review);
    println!(
        "   Fallback fraction:   {:.0}%",
        summary.fallback_fraction() * 100.0
    );

    if let Some(ref advisory) = summary.advisory {
        println!();
        println!("⚠️  {}", advisory);
    }
}
