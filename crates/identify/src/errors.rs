use std::time::Duration;

use greenmatch_core::errors::ApplicationError;
use greenmatch_core::identification::ProviderKind;
use serde::Serialize;
use thiserror::Error;

/// A single provider call that did not produce a usable payload.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Http { provider: ProviderKind, message: String },
    #[error("{provider} answered with status {status}: {body}")]
    Status { provider: ProviderKind, status: u16, body: String },
    #[error("{provider} response could not be decoded: {message}")]
    Decode { provider: ProviderKind, message: String },
    #[error("{provider} is not configured: {reason}")]
    NotConfigured { provider: ProviderKind, reason: String },
    #[error("{provider} did not answer within {timeout_ms}ms")]
    Timeout { provider: ProviderKind, timeout_ms: u64 },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Http { provider, .. }
            | Self::Status { provider, .. }
            | Self::Decode { provider, .. }
            | Self::NotConfigured { provider, .. }
            | Self::Timeout { provider, .. } => *provider,
        }
    }

    pub(crate) fn http(provider: ProviderKind, error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            return Self::Timeout { provider, timeout_ms: timeout_millis(timeout) };
        }
        // Request URLs can carry credentials (PlantNet's `api-key` query parameter).
        Self::Http { provider, message: error.without_url().to_string() }
    }
}

pub(crate) fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionError {
    #[error("image payload is empty")]
    EmptyImage,
    #[error("no identification providers are configured")]
    NoProviders,
    #[error("all {attempts} identification providers failed")]
    AllProvidersFailed { attempts: usize },
}

impl From<ProviderError> for ApplicationError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::NotConfigured { .. } => Self::Configuration(error.to_string()),
            other => Self::Integration(other.to_string()),
        }
    }
}

impl From<SelectionError> for ApplicationError {
    fn from(error: SelectionError) -> Self {
        match error {
            SelectionError::EmptyImage => {
                Self::Domain(greenmatch_core::DomainError::InvalidInput(error.to_string()))
            }
            SelectionError::NoProviders => Self::Configuration(error.to_string()),
            SelectionError::AllProvidersFailed { .. } => Self::Integration(error.to_string()),
        }
    }
}
