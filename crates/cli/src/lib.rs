pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use greenmatch_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "greenmatch",
    about = "Identify plants from photos and match them to marketplace listings",
    long_about = "Identify a plant photo through the configured providers, then match the \
                  result against a catalog of seller listings and print buyer recommendations.",
    after_help = "Examples:\n  greenmatch identify leaf.jpg --catalog listings.json\n  greenmatch match --name tomato --catalog listings.json\n  greenmatch doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Identify the plant in an image, optionally matching it against a catalog")]
    Identify {
        #[arg(help = "Path to the plant photo")]
        image: PathBuf,
        #[arg(long, help = "Catalog JSON file to match the identified plant against")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "Match a manually entered plant name against a catalog")]
    Match {
        #[arg(long, help = "Plant name as entered by the buyer")]
        name: String,
        #[arg(long, help = "Catalog JSON file")]
        catalog: PathBuf,
        #[arg(long, help = "Minimum similarity in (0, 1]; overrides matching.threshold")]
        threshold: Option<f64>,
    },
    #[command(about = "Build recommendations from a saved identification result")]
    Recommend {
        #[arg(long, help = "Identification result JSON file")]
        result: PathBuf,
        #[arg(long, help = "Catalog JSON file")]
        catalog: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, provider credentials and the alias table")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Logs go to stderr so stdout stays a single JSON payload.
fn init_logging() {
    let (level, format) = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => (config.logging.level, config.logging.format),
        Err(_) => ("warn".to_string(), LogFormat::Compact),
    };
    let log_level = level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!(event_name = "cli.logging.already_installed", "subscriber already set");
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Identify { image, catalog } => {
            commands::identify::run(&image, catalog.as_deref())
        }
        Command::Match { name, catalog, threshold } => {
            commands::matching::run(&name, &catalog, threshold)
        }
        Command::Recommend { result, catalog } => commands::recommend::run(&result, &catalog),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn match_command_parses_threshold() {
        let cli = Cli::try_parse_from([
            "greenmatch",
            "match",
            "--name",
            "tomato",
            "--catalog",
            "listings.json",
            "--threshold",
            "0.7",
        ])
        .expect("arguments parse");

        match cli.command {
            Command::Match { name, threshold, .. } => {
                assert_eq!(name, "tomato");
                assert_eq!(threshold, Some(0.7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn identify_catalog_is_optional() {
        let cli = Cli::try_parse_from(["greenmatch", "identify", "leaf.jpg"]).expect("parse");
        assert!(matches!(cli.command, Command::Identify { catalog: None, .. }));
    }
}
