use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use greenmatch_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let providers: Vec<&str> =
        config.identification.providers.iter().map(|provider| provider.id()).collect();
    let fields = [
        Field {
            key: "identification.providers",
            env_keys: &["GREENMATCH_IDENTIFICATION_PROVIDERS"],
            value: providers.join(","),
        },
        Field {
            key: "identification.min_confidence",
            env_keys: &["GREENMATCH_IDENTIFICATION_MIN_CONFIDENCE"],
            value: config.identification.min_confidence.to_string(),
        },
        Field {
            key: "plant_id.api_key",
            env_keys: &["GREENMATCH_PLANT_ID_API_KEY"],
            value: redact_key(config.plant_id.api_key.as_ref()),
        },
        Field {
            key: "plant_id.base_url",
            env_keys: &["GREENMATCH_PLANT_ID_BASE_URL"],
            value: config.plant_id.base_url.clone(),
        },
        Field {
            key: "plant_id.timeout_secs",
            env_keys: &["GREENMATCH_PLANT_ID_TIMEOUT_SECS"],
            value: config.plant_id.timeout_secs.to_string(),
        },
        Field {
            key: "plantnet.api_key",
            env_keys: &["GREENMATCH_PLANTNET_API_KEY"],
            value: redact_key(config.plantnet.api_key.as_ref()),
        },
        Field {
            key: "plantnet.base_url",
            env_keys: &["GREENMATCH_PLANTNET_BASE_URL"],
            value: config.plantnet.base_url.clone(),
        },
        Field {
            key: "plantnet.project",
            env_keys: &["GREENMATCH_PLANTNET_PROJECT"],
            value: config.plantnet.project.clone(),
        },
        Field {
            key: "plantnet.organ",
            env_keys: &["GREENMATCH_PLANTNET_ORGAN"],
            value: config.plantnet.organ.clone(),
        },
        Field {
            key: "plantnet.timeout_secs",
            env_keys: &["GREENMATCH_PLANTNET_TIMEOUT_SECS"],
            value: config.plantnet.timeout_secs.to_string(),
        },
        Field {
            key: "matching.threshold",
            env_keys: &["GREENMATCH_MATCHING_THRESHOLD"],
            value: config.matching.threshold.to_string(),
        },
        Field {
            key: "matching.alias_file",
            env_keys: &["GREENMATCH_MATCHING_ALIAS_FILE"],
            value: config
                .matching
                .alias_file
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<builtin>".to_string()),
        },
        Field {
            key: "logging.level",
            env_keys: &["GREENMATCH_LOGGING_LEVEL", "GREENMATCH_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["GREENMATCH_LOGGING_FORMAT", "GREENMATCH_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        format!("- {} = {} (source: {source})", field.key, field.value)
    }));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("greenmatch.toml"), PathBuf::from("config/greenmatch.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = first_set_env_key(env_keys, |key| env::var(key).ok()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

/// First key with a non-blank value; keys are listed in the loader's precedence order.
fn first_set_env_key<'a>(
    env_keys: &[&'a str],
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<&'a str> {
    env_keys
        .iter()
        .copied()
        .find(|key| lookup(*key).map(|value| !value.trim().is_empty()).unwrap_or(false))
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Shows at most the last four characters of a key.
fn redact_key(key: Option<&SecretString>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };
    let trimmed = key.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
