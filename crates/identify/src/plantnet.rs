use std::time::Duration;

use async_trait::async_trait;
use greenmatch_core::identification::raw::PlantNetResponse;
use greenmatch_core::identification::{ProviderKind, RawProviderResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::errors::ProviderError;
use crate::plant_id::truncate_body;
use crate::provider::IdentificationProvider;

const MAX_RESULTS: &str = "5";

/// Client for the PlantNet v2 identify endpoint.
pub struct PlantNetClient {
    client: Client,
    api_key: SecretString,
    endpoint: String,
    organ: String,
    timeout: Duration,
}

impl PlantNetClient {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        project: &str,
        organ: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ProviderError::NotConfigured {
                provider: ProviderKind::PlantNet,
                reason: "api key is empty".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build().map_err(|error| {
            ProviderError::NotConfigured {
                provider: ProviderKind::PlantNet,
                reason: format!("failed to build HTTP client: {error}"),
            }
        })?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v2/identify/{}",
                base_url.trim_end_matches('/'),
                project.trim()
            ),
            organ: organ.trim().to_ascii_lowercase(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn organ(&self) -> &str {
        &self.organ
    }

    fn form(&self, image: &[u8]) -> Result<Form, ProviderError> {
        let part = Part::bytes(image.to_vec())
            .file_name("upload.jpg")
            .mime_str("image/jpeg")
            .map_err(|error| ProviderError::http(ProviderKind::PlantNet, error, self.timeout))?;
        Ok(Form::new().part("images", part).text("organs", self.organ.clone()))
    }
}

/// Decodes a PlantNet response body. Unknown fields are ignored.
pub fn decode_response(body: &str) -> Result<PlantNetResponse, ProviderError> {
    serde_json::from_str(body).map_err(|error| ProviderError::Decode {
        provider: ProviderKind::PlantNet,
        message: error.to_string(),
    })
}

#[async_trait]
impl IdentificationProvider for PlantNetClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::PlantNet
    }

    async fn identify(&self, image: &[u8]) -> Result<RawProviderResponse, ProviderError> {
        debug!(
            event_name = "identify.plantnet.request",
            endpoint = self.endpoint.as_str(),
            organ = self.organ.as_str(),
            image_bytes = image.len(),
            "sending PlantNet identification request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("api-key", self.api_key.expose_secret()),
                ("nb-results", MAX_RESULTS),
                ("include-related-images", "false"),
            ])
            .multipart(self.form(image)?)
            .send()
            .await
            .map_err(|error| ProviderError::http(ProviderKind::PlantNet, error, self.timeout))?;

        let status = response.status();
        // PlantNet reports "species not found" as 404; that is an answer with no candidates.
        if status == StatusCode::NOT_FOUND {
            return Ok(RawProviderResponse::PlantNet(PlantNetResponse::default()));
        }

        let body = response
            .text()
            .await
            .map_err(|error| ProviderError::http(ProviderKind::PlantNet, error, self.timeout))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: ProviderKind::PlantNet,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        decode_response(&body).map(RawProviderResponse::PlantNet)
    }
}
