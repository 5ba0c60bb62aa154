//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `categorize` - Read a transaction file and run the pipeline over it
//! - `config` - Show effective config, paths and the embedded default
//! - `core` - Shared utilities (data dir, config loading, learning state file)
//! - `learn` - Personal learning commands (correct, confirm, show, predict, clear)
//! - `remote` - Remote classifier probe
//! - `rules` - Rule engine inspection

pub mod categorize;
pub mod config;
pub mod core;
pub mod learn;
pub mod remote;
pub mod rules;

// Re-export command functions for main.rs
pub use categorize::*;
pub use config::*;
pub use core::*;
pub use learn::*;
pub use remote::*;
pub use rules::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
