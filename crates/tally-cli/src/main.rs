//! Tally CLI - Transaction categorizer with personal learning
//!
//! Usage:
//!   tally categorize --file statement.csv     Categorize a transaction file
//!   tally rules test "UBER EATS" -a 22.50     Show what the local rules say
//!   tally remote probe                        Check the remote classifier
//!   tally learn correct "CORNER CAFE" -a 6 -t dining

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tally_core::ClassifierClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // Only commands that read or write learning state need a data directory
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Commands::Categorize {
            file,
            format,
            output,
            no_remote,
            review,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let remote = if no_remote {
                None
            } else {
                ClassifierClient::from_env(&config.remote)?
            };
            commands::cmd_categorize(
                &file,
                format.as_deref(),
                output.as_deref(),
                config,
                remote,
                &commands::learning_file(data_dir)?,
                review,
            )
            .await
        }
        Commands::Rules { action } => match action {
            RulesAction::Test {
                description,
                amount,
            } => commands::cmd_rules_test(&description, amount),
        },
        Commands::Remote { action } => match action {
            RemoteAction::Probe => {
                let config = commands::load_config(cli.config.as_deref())?;
                let client = ClassifierClient::from_env(&config.remote)?;
                commands::cmd_remote_probe(client).await.map(|_| ())
            }
        },
        Commands::Learn { action } => {
            let learning_file = commands::learning_file(data_dir)?;
            match action {
                None => commands::cmd_learn_show(&learning_file, 20),
                Some(LearnAction::Show { limit }) => commands::cmd_learn_show(&learning_file, limit),
                Some(LearnAction::Correct {
                    description,
                    amount,
                    to,
                    from,
                }) => {
                    let to = commands::parse_category(&to)?;
                    let from = from.as_deref().map(commands::parse_category).transpose()?;
                    commands::cmd_learn_correct(&learning_file, &description, amount, to, from)
                }
                Some(LearnAction::Confirm {
                    description,
                    amount,
                    category,
                }) => {
                    let category = commands::parse_category(&category)?;
                    commands::cmd_learn_confirm(&learning_file, &description, amount, category)
                }
                Some(LearnAction::Predict {
                    description,
                    amount,
                }) => commands::cmd_learn_predict(&learning_file, &description, amount),
                Some(LearnAction::Clear { yes }) => commands::cmd_learn_clear(&learning_file, yes),
            }
        }
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => {
                let config = commands::load_config(cli.config.as_deref())?;
                commands::cmd_config_show(&config)
            }
            Some(ConfigAction::Path) => commands::cmd_config_path(
                cli.config.as_deref(),
                &commands::learning_file(data_dir)?,
            ),
            Some(ConfigAction::Default) => commands::cmd_config_default(),
        },
    }
}
