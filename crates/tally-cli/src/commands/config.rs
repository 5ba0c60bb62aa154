//! Config commands

use std::path::Path;

use anyhow::Result;
use tally_core::config::default_config_path;
use tally_core::CategorizerConfig;

/// Print the effective configuration
pub fn cmd_config_show(config: &CategorizerConfig) -> Result<()> {
    println!("⚙️  Categorizer configuration");
    println!();
    println!("[remote]");
    println!("   timeout_secs   = {}", config.remote.timeout.as_secs());
    println!("   batch_size     = {}", config.remote.batch_size);
    println!("   api_key_header = {}", config.remote.api_key_header);
    println!();
    println!("[fallback]");
    println!("   rule_penalty   = {:.2}", config.fallback.rule_penalty);
    println!("   rule_floor     = {:.2}", config.fallback.rule_floor);
    println!();
    println!("[tiers]");
    println!("   high           = {:.2}", config.tiers.high);
    println!("   medium         = {:.2}", config.tiers.medium);
    println!();
    println!("Environment:");
    for var in [
        "CLASSIFIER_BACKEND",
        "TALLY_CLASSIFIER_URL",
        "TALLY_CLASSIFIER_API_KEY",
    ] {
        let value = match std::env::var(var) {
            Ok(_) if var.ends_with("API_KEY") => "(set)".to_string(),
            Ok(v) => v,
            Err(_) => "(not set)".to_string(),
        };
        println!("   {:<26} {}", var, value);
    }
    Ok(())
}

/// Print where config overrides and learning state live
pub fn cmd_config_path(config_override: Option<&Path>, learning_file: &Path) -> Result<()> {
    let config_path = config_override
        .map(Path::to_path_buf)
        .or_else(default_config_path);

    match config_path {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not present, using defaults)" };
            println!("Config override: {}{}", path.display(), marker);
        }
        None => println!("Config override: (no platform data directory)"),
    }
    println!("Learning state:  {}", learning_file.display());
    Ok(())
}

/// Print the embedded default config document
pub fn cmd_config_default() -> Result<()> {
    print!("{}", CategorizerConfig::default_toml());
    Ok(())
}
