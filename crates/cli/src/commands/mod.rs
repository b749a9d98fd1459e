pub mod config;
pub mod doctor;
pub mod identify;
pub mod matching;
pub mod recommend;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use greenmatch_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use greenmatch_core::domain::listing::Catalog;
use greenmatch_core::errors::{ApplicationError, InterfaceError};
use greenmatch_core::matching::CropMatchService;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_PROVIDERS: u8 = 4;
pub const EXIT_INTERNAL: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        correlation_id: Option<&str>,
        data: Value,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: correlation_id.map(str::to_string),
            data: (!data.is_null()).then_some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure payload built from an application error, carrying the
    /// user-facing message and the correlation id of the request.
    pub fn from_application_error(
        command: &str,
        error: ApplicationError,
        correlation_id: &str,
    ) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(_) => ("invalid_input", EXIT_INPUT),
            ApplicationError::Integration(_) => ("provider_unavailable", EXIT_PROVIDERS),
            ApplicationError::Configuration(_) => ("config_validation", EXIT_CONFIG),
        };
        let detail = error.to_string();
        let interface: InterfaceError = error.into_interface(correlation_id);

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({detail})", interface.user_message()),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(
    command: &str,
    overrides: ConfigOverrides,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn read_catalog(path: &Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read catalog `{}`", path.display()))?;
    Catalog::from_json(&raw).with_context(|| format!("invalid catalog `{}`", path.display()))
}

pub(crate) fn load_catalog(command: &str, path: &Path) -> Result<Catalog, CommandResult> {
    read_catalog(path).map_err(|error| {
        CommandResult::failure(command, "invalid_input", format!("{error:#}"), EXIT_INPUT)
    })
}

pub(crate) fn build_service(
    command: &str,
    config: &AppConfig,
) -> Result<CropMatchService, CommandResult> {
    CropMatchService::from_config(&config.matching).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("matching setup failed: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn to_value<T: Serialize>(command: &str, value: &T) -> Result<Value, CommandResult> {
    serde_json::to_value(value).map_err(|error| {
        CommandResult::failure(
            command,
            "serialization",
            format!("could not serialize output: {error}"),
            EXIT_INTERNAL,
        )
    })
}
