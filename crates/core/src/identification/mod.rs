//! Identification result normalization.
//!
//! Upstream providers answer in their own shapes; everything downstream works
//! on [`IdentificationResult`](crate::domain::identification::IdentificationResult).

mod normalizer;
pub mod raw;

use serde::{Deserialize, Serialize};

pub use normalizer::{clamp_confidence, normalize_response};
pub use raw::RawProviderResponse;

use crate::errors::DomainError;

/// Upstream identification services the pipeline knows how to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "plant_id")]
    PlantId,
    #[serde(rename = "plantnet")]
    PlantNet,
}

impl ProviderKind {
    /// Stable identifier recorded as `sourceService`.
    pub fn id(&self) -> &'static str {
        match self {
            Self::PlantId => "plant_id",
            Self::PlantNet => "plantnet",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PlantId => "Plant.id",
            Self::PlantNet => "PlantNet",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(&['-', '.'][..], "_").as_str() {
            "plant_id" | "plantid" => Ok(Self::PlantId),
            "plantnet" | "plant_net" => Ok(Self::PlantNet),
            other => Err(DomainError::InvalidInput(format!(
                "unsupported identification provider `{other}` (expected plant_id|plantnet)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProviderKind;

    #[test]
    fn provider_kind_parses_common_spellings() {
        assert_eq!("plant_id".parse::<ProviderKind>(), Ok(ProviderKind::PlantId));
        assert_eq!("Plant.id".parse::<ProviderKind>(), Ok(ProviderKind::PlantId));
        assert_eq!("PlantNet".parse::<ProviderKind>(), Ok(ProviderKind::PlantNet));
        assert_eq!("plant-net".parse::<ProviderKind>(), Ok(ProviderKind::PlantNet));
        assert!("inaturalist".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn provider_kind_id_round_trips_through_display() {
        for kind in [ProviderKind::PlantId, ProviderKind::PlantNet] {
            assert_eq!(kind.to_string().parse::<ProviderKind>(), Ok(kind));
        }
    }
}
