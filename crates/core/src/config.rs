use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identification::ProviderKind;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub identification: IdentificationConfig,
    pub plant_id: PlantIdConfig,
    pub plantnet: PlantNetConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct IdentificationConfig {
    /// Tried in order; the first entry is the primary provider.
    pub providers: Vec<ProviderKind>,
    pub min_confidence: f64,
}

#[derive(Clone, Debug)]
pub struct PlantIdConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PlantNetConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub project: String,
    pub organ: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub alias_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub providers: Option<Vec<ProviderKind>>,
    pub min_confidence: Option<f64>,
    pub plant_id_api_key: Option<String>,
    pub plantnet_api_key: Option<String>,
    pub match_threshold: Option<f64>,
    pub alias_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identification: IdentificationConfig {
                providers: vec![ProviderKind::PlantId, ProviderKind::PlantNet],
                min_confidence: 0.30,
            },
            plant_id: PlantIdConfig {
                api_key: None,
                base_url: "https://plant.id".to_string(),
                timeout_secs: 15,
            },
            plantnet: PlantNetConfig {
                api_key: None,
                base_url: "https://my-api.plantnet.org".to_string(),
                project: "all".to_string(),
                organ: "auto".to_string(),
                timeout_secs: 15,
            },
            matching: MatchingConfig { threshold: 0.5, alias_file: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("greenmatch.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// API key configured for `provider`, if any.
    pub fn provider_api_key(&self, provider: ProviderKind) -> Option<&SecretString> {
        match provider {
            ProviderKind::PlantId => self.plant_id.api_key.as_ref(),
            ProviderKind::PlantNet => self.plantnet.api_key.as_ref(),
        }
    }

    pub fn provider_timeout_secs(&self, provider: ProviderKind) -> u64 {
        match provider {
            ProviderKind::PlantId => self.plant_id.timeout_secs,
            ProviderKind::PlantNet => self.plantnet.timeout_secs,
        }
    }

    /// Providers listed in `identification.providers` that have no API key.
    pub fn providers_missing_credentials(&self) -> Vec<ProviderKind> {
        self.identification
            .providers
            .iter()
            .copied()
            .filter(|provider| {
                self.provider_api_key(*provider)
                    .map(|key| key.expose_secret().trim().is_empty())
                    .unwrap_or(true)
            })
            .collect()
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(identification) = patch.identification {
            if let Some(providers) = identification.providers {
                self.identification.providers = providers;
            }
            if let Some(min_confidence) = identification.min_confidence {
                self.identification.min_confidence = min_confidence;
            }
        }

        if let Some(plant_id) = patch.plant_id {
            if let Some(plant_id_api_key_value) = plant_id.api_key {
                self.plant_id.api_key = Some(secret_value(plant_id_api_key_value));
            }
            if let Some(base_url) = plant_id.base_url {
                self.plant_id.base_url = base_url;
            }
            if let Some(timeout_secs) = plant_id.timeout_secs {
                self.plant_id.timeout_secs = timeout_secs;
            }
        }

        if let Some(plantnet) = patch.plantnet {
            if let Some(plantnet_api_key_value) = plantnet.api_key {
                self.plantnet.api_key = Some(secret_value(plantnet_api_key_value));
            }
            if let Some(base_url) = plantnet.base_url {
                self.plantnet.base_url = base_url;
            }
            if let Some(project) = plantnet.project {
                self.plantnet.project = project;
            }
            if let Some(organ) = plantnet.organ {
                self.plantnet.organ = organ;
            }
            if let Some(timeout_secs) = plantnet.timeout_secs {
                self.plantnet.timeout_secs = timeout_secs;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(threshold) = matching.threshold {
                self.matching.threshold = threshold;
            }
            if let Some(alias_file) = matching.alias_file {
                self.matching.alias_file = Some(alias_file);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GREENMATCH_IDENTIFICATION_PROVIDERS") {
            self.identification.providers =
                parse_providers("GREENMATCH_IDENTIFICATION_PROVIDERS", &value)?;
        }
        if let Some(value) = read_env("GREENMATCH_IDENTIFICATION_MIN_CONFIDENCE") {
            self.identification.min_confidence =
                parse_f64("GREENMATCH_IDENTIFICATION_MIN_CONFIDENCE", &value)?;
        }

        if let Some(value) = read_env("GREENMATCH_PLANT_ID_API_KEY") {
            self.plant_id.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("GREENMATCH_PLANT_ID_BASE_URL") {
            self.plant_id.base_url = value;
        }
        if let Some(value) = read_env("GREENMATCH_PLANT_ID_TIMEOUT_SECS") {
            self.plant_id.timeout_secs = parse_u64("GREENMATCH_PLANT_ID_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GREENMATCH_PLANTNET_API_KEY") {
            self.plantnet.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("GREENMATCH_PLANTNET_BASE_URL") {
            self.plantnet.base_url = value;
        }
        if let Some(value) = read_env("GREENMATCH_PLANTNET_PROJECT") {
            self.plantnet.project = value;
        }
        if let Some(value) = read_env("GREENMATCH_PLANTNET_ORGAN") {
            self.plantnet.organ = value;
        }
        if let Some(value) = read_env("GREENMATCH_PLANTNET_TIMEOUT_SECS") {
            self.plantnet.timeout_secs = parse_u64("GREENMATCH_PLANTNET_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GREENMATCH_MATCHING_THRESHOLD") {
            self.matching.threshold = parse_f64("GREENMATCH_MATCHING_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("GREENMATCH_MATCHING_ALIAS_FILE") {
            self.matching.alias_file = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("GREENMATCH_LOGGING_LEVEL").or_else(|| read_env("GREENMATCH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GREENMATCH_LOGGING_FORMAT").or_else(|| read_env("GREENMATCH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(providers) = overrides.providers {
            self.identification.providers = providers;
        }
        if let Some(min_confidence) = overrides.min_confidence {
            self.identification.min_confidence = min_confidence;
        }
        if let Some(plant_id_api_key) = overrides.plant_id_api_key {
            self.plant_id.api_key = Some(secret_value(plant_id_api_key));
        }
        if let Some(plantnet_api_key) = overrides.plantnet_api_key {
            self.plantnet.api_key = Some(secret_value(plantnet_api_key));
        }
        if let Some(threshold) = overrides.match_threshold {
            self.matching.threshold = threshold;
        }
        if let Some(alias_file) = overrides.alias_file {
            self.matching.alias_file = Some(alias_file);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identification(&self.identification)?;
        validate_plant_id(&self.plant_id)?;
        validate_plantnet(&self.plantnet)?;
        validate_matching(&self.matching)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("greenmatch.toml"), PathBuf::from("config/greenmatch.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_identification(identification: &IdentificationConfig) -> Result<(), ConfigError> {
    if identification.providers.is_empty() {
        return Err(ConfigError::Validation(
            "identification.providers must list at least one provider".to_string(),
        ));
    }

    for (index, provider) in identification.providers.iter().enumerate() {
        if identification.providers[..index].contains(provider) {
            return Err(ConfigError::Validation(format!(
                "identification.providers lists `{provider}` more than once"
            )));
        }
    }

    if !(0.0..=1.0).contains(&identification.min_confidence) {
        return Err(ConfigError::Validation(
            "identification.min_confidence must be in range 0..=1".to_string(),
        ));
    }

    Ok(())
}

fn validate_plant_id(plant_id: &PlantIdConfig) -> Result<(), ConfigError> {
    validate_base_url("plant_id.base_url", &plant_id.base_url)?;
    validate_timeout("plant_id.timeout_secs", plant_id.timeout_secs)
}

fn validate_plantnet(plantnet: &PlantNetConfig) -> Result<(), ConfigError> {
    validate_base_url("plantnet.base_url", &plantnet.base_url)?;
    validate_timeout("plantnet.timeout_secs", plantnet.timeout_secs)?;

    if plantnet.project.trim().is_empty() {
        return Err(ConfigError::Validation("plantnet.project must not be empty".to_string()));
    }

    match plantnet.organ.trim().to_ascii_lowercase().as_str() {
        "auto" | "leaf" | "flower" | "fruit" | "bark" | "habit" | "other" => Ok(()),
        _ => Err(ConfigError::Validation(
            "plantnet.organ must be one of auto|leaf|flower|fruit|bark|habit|other".to_string(),
        )),
    }
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    if !(matching.threshold > 0.0 && matching.threshold <= 1.0) {
        return Err(ConfigError::Validation(
            "matching.threshold must be in range (0, 1]".to_string(),
        ));
    }

    if let Some(path) = &matching.alias_file {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "matching.alias_file `{}` does not exist",
                path.display()
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_base_url(key: &str, base_url: &str) -> Result<(), ConfigError> {
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{key} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 120 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=120")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_providers(key: &str, value: &str) -> Result<Vec<ProviderKind>, ConfigError> {
    value
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            item.parse::<ProviderKind>().map_err(|_| ConfigError::InvalidEnvOverride {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    identification: Option<IdentificationPatch>,
    plant_id: Option<PlantIdPatch>,
    plantnet: Option<PlantNetPatch>,
    matching: Option<MatchingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct IdentificationPatch {
    providers: Option<Vec<ProviderKind>>,
    min_confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PlantIdPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PlantNetPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    project: Option<String>,
    organ: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    threshold: Option<f64>,
    alias_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
