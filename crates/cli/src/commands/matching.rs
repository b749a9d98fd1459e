use std::path::Path;

use greenmatch_core::config::ConfigOverrides;

use crate::commands::{
    build_service, load_catalog, load_config, to_value, CommandResult, EXIT_INPUT,
};

const COMMAND: &str = "match";

/// Matches a plant name typed by the buyer against a catalog file.
pub fn run(plant_name: &str, catalog_path: &Path, threshold: Option<f64>) -> CommandResult {
    if plant_name.trim().is_empty() {
        return CommandResult::failure(
            COMMAND,
            "invalid_input",
            "plant name must not be empty",
            EXIT_INPUT,
        );
    }

    let overrides = ConfigOverrides { match_threshold: threshold, ..ConfigOverrides::default() };
    let config = match load_config(COMMAND, overrides) {
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

    let outcome = service.match_name(plant_name, &catalog);
    let message = format!(
        "{} of {} active listings matched `{}`",
        outcome.matches.len(),
        catalog.active_listings().len(),
        outcome.plant_name
    );

    match to_value(COMMAND, &outcome) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, None, data),
        Err(failure) => failure,
    }
}
