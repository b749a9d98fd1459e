use chrono::Utc;
use tracing::debug;

use super::raw::{PlantIdResponse, PlantIdSuggestion, PlantNetResponse, PlantNetResult};
use super::RawProviderResponse;
use crate::domain::identification::{
    IdentificationCandidate, IdentificationResult, UNKNOWN_FAMILY, UNKNOWN_GENUS, UNKNOWN_SPECIES,
};

/// Converts a provider payload into the canonical result.
///
/// Pure transform: missing fields become sentinels, confidences are clamped
/// into `0.0..=1.0`, and a payload without suggestions yields an empty result.
/// `fallback_used` is left `false`; the selector stamps it.
pub fn normalize_response(raw: &RawProviderResponse) -> IdentificationResult {
    let candidates = match raw {
        RawProviderResponse::PlantId(response) => plant_id_candidates(response),
        RawProviderResponse::PlantNet(response) => plantnet_candidates(response),
    };

    let source = raw.provider_kind();
    debug!(
        event_name = "identify.normalize.completed",
        provider = source.id(),
        candidate_count = candidates.len(),
        "provider payload normalized"
    );

    IdentificationResult::new(candidates, source.id(), false, Utc::now())
}

/// Clamps a provider score into `0.0..=1.0`; absent or non-finite scores become `0.0`.
pub fn clamp_confidence(value: Option<f64>) -> f64 {
    match value {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn plant_id_candidates(response: &PlantIdResponse) -> Vec<IdentificationCandidate> {
    let suggestions = response
        .result
        .as_ref()
        .and_then(|result| result.classification.as_ref())
        .and_then(|classification| classification.suggestions.as_deref())
        .unwrap_or_default();

    suggestions.iter().map(plant_id_candidate).collect()
}

fn plant_id_candidate(suggestion: &PlantIdSuggestion) -> IdentificationCandidate {
    let details = suggestion.details.as_ref();
    let taxonomy = details.and_then(|details| details.taxonomy.as_ref());

    IdentificationCandidate {
        scientific_name: text_or(suggestion.name.as_deref(), UNKNOWN_SPECIES),
        common_names: clean_names(details.and_then(|details| details.common_names.as_deref())),
        family: text_or(taxonomy.and_then(|taxonomy| taxonomy.family.as_deref()), UNKNOWN_FAMILY),
        genus: text_or(taxonomy.and_then(|taxonomy| taxonomy.genus.as_deref()), UNKNOWN_GENUS),
        confidence: clamp_confidence(suggestion.probability),
        rank: 0,
    }
}

fn plantnet_candidates(response: &PlantNetResponse) -> Vec<IdentificationCandidate> {
    response.results.as_deref().unwrap_or_default().iter().map(plantnet_candidate).collect()
}

fn plantnet_candidate(result: &PlantNetResult) -> IdentificationCandidate {
    let species = result.species.as_ref();

    IdentificationCandidate {
        scientific_name: text_or(species.and_then(|species| species.name()), UNKNOWN_SPECIES),
        common_names: clean_names(species.and_then(|species| species.common_names.as_deref())),
        family: text_or(
            species.and_then(|species| species.family.as_ref()).and_then(|family| family.name()),
            UNKNOWN_FAMILY,
        ),
        genus: text_or(
            species.and_then(|species| species.genus.as_ref()).and_then(|genus| genus.name()),
            UNKNOWN_GENUS,
        ),
        confidence: clamp_confidence(result.score),
        rank: 0,
    }
}

fn text_or(value: Option<&str>, sentinel: &str) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(sentinel)
        .to_string()
}

fn clean_names(names: Option<&[String]>) -> Vec<String> {
    names
        .unwrap_or_default()
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
