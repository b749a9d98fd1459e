use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use greenmatch_core::config::ConfigOverrides;
use greenmatch_core::errors::ApplicationError;
use greenmatch_core::matching::MatchOutcome;
use greenmatch_identify::{build_selector, Selection};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::commands::{
    build_service, load_catalog, load_config, to_value, CommandResult, EXIT_INPUT,
    EXIT_INTERNAL,
};

const COMMAND: &str = "identify";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyReport<'a> {
    selection: &'a Selection,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<MatchOutcome>,
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    let image =
        fs::read(path).with_context(|| format!("could not read image `{}`", path.display()))?;
    ensure!(!image.is_empty(), "image `{}` is empty", path.display());
    Ok(image)
}

/// Identifies the plant in `image_path`, optionally matching it against a catalog.
pub fn run(image_path: &Path, catalog_path: Option<&Path>) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();

    let image = match read_image(image_path) {
        Ok(image) => image,
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
    let catalog = match catalog_path.map(|path| load_catalog(COMMAND, path)).transpose() {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };
    let service = match build_service(COMMAND, &config) {
        Ok(service) => service,
        Err(failure) => return failure,
    };
    let selector = match build_selector(&config) {
        Ok(selector) => selector,
        Err(error) => {
            return CommandResult::from_application_error(COMMAND, error, &correlation_id)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_INTERNAL,
            );
        }
    };

    let selection = match runtime.block_on(selector.select(&image, &correlation_id)) {
        Ok(selection) => selection,
        Err(error) => {
            return CommandResult::from_application_error(
                COMMAND,
                ApplicationError::from(error),
                &correlation_id,
            )
        }
    };

    if let Some(error) = selection.error.clone() {
        return CommandResult::from_application_error(
            COMMAND,
            ApplicationError::from(error),
            &correlation_id,
        );
    }

    let outcome = catalog.as_ref().map(|catalog| service.run(&selection.result, catalog));
    let message = match selection.result.top() {
        Some(top) => format!(
            "identified {} ({:.0}% via {})",
            top.scientific_name,
            top.confidence_pct(),
            selection.result.source_service
        ),
        None => "no plant could be identified; enter the plant name manually".to_string(),
    };

    info!(
        event_name = "identify.command.completed",
        correlation_id = correlation_id.as_str(),
        source_service = selection.result.source_service.as_str(),
        fallback_used = selection.result.fallback_used,
        attempts = selection.attempts.len(),
        "identify command completed"
    );

    let report = IdentifyReport { selection: &selection, outcome };
    match to_value(COMMAND, &report) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, Some(&correlation_id), data),
        Err(failure) => failure,
    }
}
