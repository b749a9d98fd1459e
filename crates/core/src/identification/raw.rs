//! Provider payload shapes as they arrive over the wire.
//!
//! Every field is optional: providers omit or null out fields freely, and the
//! normalizer substitutes sentinels instead of rejecting the payload.

use serde::{Deserialize, Serialize};

use super::ProviderKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawProviderResponse {
    PlantId(PlantIdResponse),
    PlantNet(PlantNetResponse),
}

impl RawProviderResponse {
    pub fn provider_kind(&self) -> ProviderKind {
        match self {
            Self::PlantId(_) => ProviderKind::PlantId,
            Self::PlantNet(_) => ProviderKind::PlantNet,
        }
    }
}

// Plant.id v3 `/api/v3/identification`

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<PlantIdResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdResult {
    #[serde(default)]
    pub is_plant: Option<PlantIdIsPlant>,
    #[serde(default)]
    pub classification: Option<PlantIdClassification>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdIsPlant {
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub binary: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdClassification {
    #[serde(default)]
    pub suggestions: Option<Vec<PlantIdSuggestion>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdSuggestion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub details: Option<PlantIdDetails>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdDetails {
    #[serde(default)]
    pub common_names: Option<Vec<String>>,
    #[serde(default)]
    pub taxonomy: Option<PlantIdTaxonomy>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantIdTaxonomy {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
}

// PlantNet v2 `/v2/identify/{project}`

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantNetResponse {
    #[serde(default)]
    pub best_match: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<PlantNetResult>>,
    #[serde(default)]
    pub remaining_identification_requests: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantNetResult {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub species: Option<PlantNetSpecies>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantNetSpecies {
    #[serde(default)]
    pub scientific_name_without_author: Option<String>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub common_names: Option<Vec<String>>,
    #[serde(default)]
    pub family: Option<PlantNetTaxon>,
    #[serde(default)]
    pub genus: Option<PlantNetTaxon>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantNetTaxon {
    #[serde(default)]
    pub scientific_name_without_author: Option<String>,
    #[serde(default)]
    pub scientific_name: Option<String>,
}

impl PlantNetTaxon {
    pub fn name(&self) -> Option<&str> {
        first_present(&self.scientific_name_without_author, &self.scientific_name)
    }
}

impl PlantNetSpecies {
    pub fn name(&self) -> Option<&str> {
        first_present(&self.scientific_name_without_author, &self.scientific_name)
    }
}

fn first_present<'a>(preferred: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    [preferred, fallback]
        .into_iter()
        .filter_map(|value| value.as_deref())
        .find(|value| !value.trim().is_empty())
}
