//! Remote classifier commands

use anyhow::Result;
use tally_core::{remote::PROBE_DESCRIPTIONS, ClassifierBackend, ClassifierClient};

/// Probe the configured remote classifier with the fixed two-item batch
///
/// Returns whether the classifier answered. A missing configuration is not an
/// error; the pipeline simply runs locally.
pub async fn cmd_remote_probe(client: Option<ClassifierClient>) -> Result<bool> {
    let Some(client) = client else {
        println!("⚠️  No remote classifier configured");
        println!();
        println!("To enable remote classification:");
        println!("  export TALLY_CLASSIFIER_URL=https://classifier.example.com/classify");
        println!("  export TALLY_CLASSIFIER_API_KEY=<key>");
        println!("  (or CLASSIFIER_BACKEND=mock for an offline stand-in)");
        return Ok(false);
    };

    println!(
        "🔍 Probing {} classifier at {}...",
        client.backend_name(),
        client.host()
    );

    let probe: Vec<String> = PROBE_DESCRIPTIONS.iter().map(|s| s.to_string()).collect();
    match client.classify_batch(&probe).await {
        Ok(labels) => {
            println!("✅ Classifier is reachable");
            for (description, label) in probe.iter().zip(labels.iter()) {
                println!("   {} → {}", description, label);
            }
            Ok(true)
        }
        Err(e) => {
            println!("❌ Classifier unavailable: {}", e);
            println!("   Categorization will fall back to personal learning and local rules.");
            Ok(false)
        }
    }
}
