use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use greenmatch_core::identification::raw::PlantIdResponse;
use greenmatch_core::identification::{ProviderKind, RawProviderResponse};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use crate::errors::ProviderError;
use crate::provider::IdentificationProvider;

/// Detail blocks requested from Plant.id; the normalizer reads both.
const DETAILS: &str = "common_names,taxonomy";
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Serialize)]
struct PlantIdRequest {
    images: Vec<String>,
    similar_images: bool,
}

/// Client for the Plant.id v3 identification endpoint.
pub struct PlantIdClient {
    client: Client,
    api_key: SecretString,
    endpoint: String,
    timeout: Duration,
}

impl PlantIdClient {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ProviderError::NotConfigured {
                provider: ProviderKind::PlantId,
                reason: "api key is empty".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build().map_err(|error| {
            ProviderError::NotConfigured {
                provider: ProviderKind::PlantId,
                reason: format!("failed to build HTTP client: {error}"),
            }
        })?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/api/v3/identification", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(image: &[u8]) -> PlantIdRequest {
        PlantIdRequest { images: vec![STANDARD.encode(image)], similar_images: false }
    }
}

/// Decodes a Plant.id response body. Unknown fields are ignored.
pub fn decode_response(body: &str) -> Result<PlantIdResponse, ProviderError> {
    serde_json::from_str(body).map_err(|error| ProviderError::Decode {
        provider: ProviderKind::PlantId,
        message: error.to_string(),
    })
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
    truncated.push_str("...");
    truncated
}

#[async_trait]
impl IdentificationProvider for PlantIdClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::PlantId
    }

    async fn identify(&self, image: &[u8]) -> Result<RawProviderResponse, ProviderError> {
        debug!(
            event_name = "identify.plant_id.request",
            endpoint = self.endpoint.as_str(),
            image_bytes = image.len(),
            "sending Plant.id identification request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("details", DETAILS)])
            .header("Api-Key", self.api_key.expose_secret())
            .json(&Self::request_body(image))
            .send()
            .await
            .map_err(|error| ProviderError::http(ProviderKind::PlantId, error, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ProviderError::http(ProviderKind::PlantId, error, self.timeout))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: ProviderKind::PlantId,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        decode_response(&body).map(RawProviderResponse::PlantId)
    }
}
