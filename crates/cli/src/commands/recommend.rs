use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use greenmatch_core::config::ConfigOverrides;
use greenmatch_core::domain::identification::IdentificationResult;

use crate::commands::{
    build_service, load_catalog, load_config, to_value, CommandResult, EXIT_INPUT,
};

const COMMAND: &str = "recommend";

fn read_identification(path: &Path) -> Result<IdentificationResult> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read identification result `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid identification result `{}`", path.display()))
}

/// Builds recommendations for a previously saved identification result.
pub fn run(result_path: &Path, catalog_path: &Path) -> CommandResult {
    let identification = match read_identification(result_path) {
        Ok(identification) => identification,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "invalid_input",
                format!("{error:#}"),
                EXIT_INPUT,
            );
        }
    };

    let config = match load_config(COMMAND, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let service = match build_service(COMMAND, &config) {
        Ok(service) => service,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog(COMMAND, catalog_path) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };

    let outcome = service.run(&identification, &catalog);
    let message = outcome
        .recommendations
        .first()
        .map(|recommendation| recommendation.message.clone())
        .unwrap_or_default();

    match to_value(COMMAND, &outcome.recommendations) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, None, data),
        Err(failure) => failure,
    }
}
