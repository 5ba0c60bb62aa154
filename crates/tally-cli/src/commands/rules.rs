//! Rule engine inspection

use anyhow::Result;
use tally_core::RuleEngine;

/// Show how the static rules classify a description
pub fn cmd_rules_test(description: &str, amount: f64) -> Result<()> {
    let rules = RuleEngine::new();

    println!();
    println!("🔍 Rules for \"{}\" ({:.2}):", description, amount);
    println!("   ─────────────────────────────────────────────────────────────");

    match rules.classify(description, amount) {
        Some(rule) => {
            println!("   Category:   {}", rule.category);
            println!("   Confidence: {:.2}", rule.confidence);
            println!("   Stage:      {}", rule.stage);
            println!("   Matched:    {}", rule.matched);
            if rule.is_financial_movement() {
                println!();
                println!("   💸 Financial movement: kept uncategorized regardless of remote labels");
            }
        }
        None => {
            let (category, confidence) = rules.categorize(description, amount);
            println!("   No rule matched → {} ({:.2})", category, confidence);
        }
    }

    Ok(())
}
