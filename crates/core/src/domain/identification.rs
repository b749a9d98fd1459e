use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identification::clamp_confidence;

pub const UNKNOWN_SPECIES: &str = "Unknown species";
pub const UNKNOWN_FAMILY: &str = "Unknown family";
pub const UNKNOWN_GENUS: &str = "Unknown genus";

/// One species guess from an identification provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationCandidate {
    pub scientific_name: String,
    /// Ordered as the provider reported them; the first entry is the primary name.
    pub common_names: Vec<String>,
    pub family: String,
    pub genus: String,
    /// Always within `0.0..=1.0`.
    pub confidence: f64,
    /// 1-based position in descending-confidence order.
    pub rank: u32,
}

impl IdentificationCandidate {
    pub fn primary_common_name(&self) -> Option<&str> {
        self.common_names.first().map(String::as_str)
    }

    pub fn is_unknown_species(&self) -> bool {
        self.scientific_name == UNKNOWN_SPECIES
    }

    pub fn confidence_pct(&self) -> f64 {
        (self.confidence * 100.0).round()
    }
}

/// Canonical identification answer, independent of which provider produced it.
///
/// Candidates are kept sorted by descending confidence with ranks matching
/// their position; the only way to build a result is through [`IdentificationResult::new`]
/// (deserialisation goes through the same path).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "IdentificationResultWire")]
pub struct IdentificationResult {
    candidates: Vec<IdentificationCandidate>,
    pub source_service: String,
    pub fallback_used: bool,
    pub timestamp: DateTime<Utc>,
}

impl IdentificationResult {
    pub fn new(
        mut candidates: Vec<IdentificationCandidate>,
        source_service: impl Into<String>,
        fallback_used: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        for candidate in candidates.iter_mut() {
            candidate.confidence = clamp_confidence(Some(candidate.confidence));
        }
        candidates.sort_by(|left, right| right.confidence.total_cmp(&left.confidence));
        for (index, candidate) in candidates.iter_mut().enumerate() {
            candidate.rank = index as u32 + 1;
        }

        Self { candidates, source_service: source_service.into(), fallback_used, timestamp }
    }

    pub fn empty(source_service: impl Into<String>, fallback_used: bool) -> Self {
        Self::new(Vec::new(), source_service, fallback_used, Utc::now())
    }

    pub fn candidates(&self) -> &[IdentificationCandidate] {
        &self.candidates
    }

    pub fn top(&self) -> Option<&IdentificationCandidate> {
        self.candidates.first()
    }

    /// Confidence of the best candidate, `0.0` when there is none.
    pub fn top_confidence(&self) -> f64 {
        self.top().map(|candidate| candidate.confidence).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn with_fallback(mut self, source_service: impl Into<String>, fallback_used: bool) -> Self {
        self.source_service = source_service.into();
        self.fallback_used = fallback_used;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationResultWire {
    #[serde(default)]
    candidates: Vec<IdentificationCandidate>,
    source_service: String,
    #[serde(default)]
    fallback_used: bool,
    timestamp: DateTime<Utc>,
}

impl From<IdentificationResultWire> for IdentificationResult {
    fn from(wire: IdentificationResultWire) -> Self {
        Self::new(wire.candidates, wire.source_service, wire.fallback_used, wire.timestamp)
    }
}
