//! Personal learning commands
//!
//! Each command loads the learning state file, applies one change and writes
//! it back atomically.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use tally_core::{Category, LearningEngine, RuleEngine};

use super::core::{load_learning, save_learning};
use super::truncate;

/// Teach a correction; `from` defaults to what the rule engine would say
pub fn cmd_learn_correct(
    learning_file: &Path,
    description: &str,
    amount: f64,
    to: Category,
    from: Option<Category>,
) -> Result<()> {
    let from = from.unwrap_or_else(|| RuleEngine::new().categorize(description, amount).0);

    let mut engine = load_learning(learning_file)?;
    engine.learn_from_correction(description, amount, from, to);
    save_learning(learning_file, &engine.snapshot())?;

    println!("✅ Learned: \"{}\" {} → {}", description, from, to);
    print_prediction(&engine, description, amount);
    Ok(())
}

/// Reinforce a categorization the user agrees with
pub fn cmd_learn_confirm(
    learning_file: &Path,
    description: &str,
    amount: f64,
    category: Category,
) -> Result<()> {
    let mut engine = load_learning(learning_file)?;
    engine.reinforce_correct_categorization(description, amount, category);
    save_learning(learning_file, &engine.snapshot())?;

    println!("✅ Confirmed: \"{}\" is {}", description, category);
    print_prediction(&engine, description, amount);
    Ok(())
}

/// Print learned merchants and patterns
pub fn cmd_learn_show(learning_file: &Path, limit: usize) -> Result<()> {
    let engine = load_learning(learning_file)?;
    let summary = engine.summary();

    println!();
    println!("🧠 Personal learning ({})", learning_file.display());
    println!("   ─────────────────────────────");
    println!("   Merchants:          {}", summary.merchant_count);
    println!("   Patterns:           {}", summary.pattern_count);
    println!("   Strong patterns:    {}", summary.strong_pattern_count);
    println!("   Unstable merchants: {}", summary.unstable_merchant_count);

    if engine.is_empty() {
        println!();
        println!("Nothing learned yet. Use 'tally learn correct' to teach a category.");
        return Ok(());
    }

    let mut merchants: Vec<_> = engine.merchants().collect();
    merchants.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.key.cmp(&b.key)));

    println!();
    println!(
        "{:<24} {:<15} {:>5} {:>7} {:>17}",
        "Merchant", "Category", "Uses", "Changes", "Amounts"
    );
    println!("{}", "─".repeat(72));
    for mapping in merchants.iter().take(limit) {
        println!(
            "{:<24} {:<15} {:>5} {:>7} {:>8.2}-{:<8.2}",
            truncate(&mapping.key, 24),
            mapping.preferred_category.as_str(),
            mapping.usage_count,
            mapping.category_changes,
            mapping.amount_range.min,
            mapping.amount_range.max,
        );
    }

    let mut patterns: Vec<_> = engine.patterns().collect();
    patterns.sort_by(|a, b| {
        b.strength
            .cmp(&a.strength)
            .then(b.confidence.total_cmp(&a.confidence))
    });

    println!();
    println!("{:<24} {:<15} {:>8} {:>6}", "Token", "Category", "Strength", "Conf");
    println!("{}", "─".repeat(56));
    for pattern in patterns.iter().take(limit) {
        println!(
            "{:<24} {:<15} {:>8} {:>6.2}",
            truncate(&pattern.token, 24),
            pattern.category.as_str(),
            pattern.strength,
            pattern.confidence,
        );
    }

    Ok(())
}

/// Predict from learning state alone
pub fn cmd_learn_predict(learning_file: &Path, description: &str, amount: f64) -> Result<()> {
    let engine = load_learning(learning_file)?;
    print_prediction(&engine, description, amount);
    Ok(())
}

/// Forget everything learned
pub fn cmd_learn_clear(learning_file: &Path, yes: bool) -> Result<()> {
    if !learning_file.exists() {
        println!("Nothing to clear.");
        return Ok(());
    }

    if !yes {
        print!("⚠️  This will forget every learned merchant and pattern.\n\n");
        print!("Are you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut engine = load_learning(learning_file)?;
    engine.clear();
    save_learning(learning_file, &engine.snapshot())?;
    println!("✅ Cleared personal learning state");
    Ok(())
}

fn print_prediction(engine: &LearningEngine, description: &str, amount: f64) {
    match engine.predict_description(description, amount) {
        Some(prediction) => {
            let alternatives: Vec<&str> =
                prediction.alternatives.iter().map(|c| c.as_str()).collect();
            println!(
                "   Prediction: {} ({:.2}) - {}",
                prediction.category, prediction.confidence, prediction.reason
            );
            if !alternatives.is_empty() {
                println!("   Alternatives: {}", alternatives.join(", "));
            }
        }
        None => println!("   No confident prediction for \"{}\"", description),
    }
}
