use std::sync::Arc;
use std::time::{Duration, Instant};

use greenmatch_core::domain::identification::IdentificationResult;
use greenmatch_core::identification::{normalize_response, ProviderKind};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{timeout_millis, SelectionError};
use crate::provider::IdentificationProvider;

/// A provider together with the bound on a single call to it.
#[derive(Clone)]
pub struct ProviderSlot {
    provider: Arc<dyn IdentificationProvider>,
    timeout: Duration,
}

impl ProviderSlot {
    pub fn new(provider: Arc<dyn IdentificationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("provider", &self.kind())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted { confidence: f64 },
    LowConfidence { confidence: f64 },
    Failed { message: String },
    TimedOut { timeout_ms: u64 },
}

impl AttemptOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Accepted { .. } | Self::LowConfidence { .. })
    }
}

/// What happened on one provider call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider: ProviderKind,
    /// Position in the configured order; `0` is the primary.
    pub position: usize,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u64,
}

/// Final answer of a selection run plus the audit trail that led to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub result: IdentificationResult,
    pub attempts: Vec<ProviderAttempt>,
    /// Set only when no provider produced an answer at all.
    pub error: Option<SelectionError>,
}

impl Selection {
    /// Provider whose answer became `result`, if any answered.
    pub fn answered_by(&self) -> Option<ProviderKind> {
        if self.error.is_some() {
            return None;
        }
        self.result.source_service.parse().ok()
    }
}

/// Calls providers strictly in order and keeps the first adequate answer.
#[derive(Clone, Debug)]
pub struct FallbackSelector {
    slots: Vec<ProviderSlot>,
    min_confidence: f64,
}

impl FallbackSelector {
    pub fn new(slots: Vec<ProviderSlot>, min_confidence: f64) -> Result<Self, SelectionError> {
        if slots.is_empty() {
            return Err(SelectionError::NoProviders);
        }
        Ok(Self { slots, min_confidence })
    }

    pub fn slots(&self) -> &[ProviderSlot] {
        &self.slots
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Identifies `image`, falling back on error, timeout or low confidence.
    ///
    /// If no provider clears `min_confidence`, the last answer received is
    /// returned. If none answered, the result is empty and `error` is set.
    pub async fn select(
        &self,
        image: &[u8],
        correlation_id: &str,
    ) -> Result<Selection, SelectionError> {
        if image.is_empty() {
            return Err(SelectionError::EmptyImage);
        }

        let mut attempts = Vec::with_capacity(self.slots.len());
        let mut last_answer: Option<IdentificationResult> = None;

        for (position, slot) in self.slots.iter().enumerate() {
            let kind = slot.kind();
            let started = Instant::now();
            let call = tokio::time::timeout(slot.timeout, slot.provider.identify(image)).await;
            let elapsed_ms = timeout_millis(started.elapsed());

            let outcome = match call {
                Err(_) => {
                    let timeout_ms = timeout_millis(slot.timeout);
                    warn!(
                        event_name = "identify.attempt.timed_out",
                        correlation_id,
                        provider = kind.id(),
                        position,
                        timeout_ms,
                        "identification provider timed out"
                    );
                    AttemptOutcome::TimedOut { timeout_ms }
                }
                Ok(Err(error)) => {
                    warn!(
                        event_name = "identify.attempt.failed",
                        correlation_id,
                        provider = kind.id(),
                        position,
                        elapsed_ms,
                        error = %error,
                        "identification provider failed"
                    );
                    AttemptOutcome::Failed { message: error.to_string() }
                }
                Ok(Ok(raw)) => {
                    let result = normalize_response(&raw).with_fallback(kind.id(), position > 0);
                    let confidence = result.top_confidence();

                    if !result.is_empty() && confidence >= self.min_confidence {
                        info!(
                            event_name = "identify.attempt.accepted",
                            correlation_id,
                            provider = kind.id(),
                            position,
                            elapsed_ms,
                            confidence,
                            fallback_used = result.fallback_used,
                            "identification accepted"
                        );
                        attempts.push(ProviderAttempt {
                            provider: kind,
                            position,
                            outcome: AttemptOutcome::Accepted { confidence },
                            elapsed_ms,
                        });
                        return Ok(Selection { result, attempts, error: None });
                    }

                    info!(
                        event_name = "identify.attempt.low_confidence",
                        correlation_id,
                        provider = kind.id(),
                        position,
                        elapsed_ms,
                        confidence,
                        min_confidence = self.min_confidence,
                        "identification below minimum confidence"
                    );
                    last_answer = Some(result);
                    AttemptOutcome::LowConfidence { confidence }
                }
            };

            attempts.push(ProviderAttempt { provider: kind, position, outcome, elapsed_ms });
        }

        if let Some(result) = last_answer {
            return Ok(Selection { result, attempts, error: None });
        }

        let error = SelectionError::AllProvidersFailed { attempts: attempts.len() };
        let (source, position) = attempts
            .last()
            .map(|attempt| (attempt.provider, attempt.position))
            .unwrap_or((self.slots[0].kind(), 0));
        warn!(
            event_name = "identify.selection.exhausted",
            correlation_id,
            attempts = attempts.len(),
            "no identification provider answered"
        );

        Ok(Selection {
            result: IdentificationResult::empty(source.id(), position > 0),
            attempts,
            error: Some(error),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use greenmatch_core::identification::raw::{
        PlantIdClassification, PlantIdResponse, PlantIdResult, PlantIdSuggestion,
    };
    use greenmatch_core::identification::{ProviderKind, RawProviderResponse};

    use super::{AttemptOutcome, FallbackSelector, ProviderSlot};
    use crate::errors::{ProviderError, SelectionError};
    use crate::provider::IdentificationProvider;

    enum Script {
        Answer(f64),
        Empty,
        Fail,
        Hang,
    }

    struct ScriptedProvider {
        kind: ProviderKind,
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(kind: ProviderKind, script: Script) -> Arc<Self> {
            Arc::new(Self { kind, script, calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn answer(name: &str, probability: f64) -> RawProviderResponse {
        RawProviderResponse::PlantId(PlantIdResponse {
            result: Some(PlantIdResult {
                is_plant: None,
                classification: Some(PlantIdClassification {
                    suggestions: Some(vec![PlantIdSuggestion {
                        name: Some(name.to_string()),
                        probability: Some(probability),
                        ..PlantIdSuggestion::default()
                    }]),
                }),
            }),
            ..PlantIdResponse::default()
        })
    }

    #[async_trait]
    impl IdentificationProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn identify(&self, _image: &[u8]) -> Result<RawProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Answer(probability) => Ok(answer("Solanum lycopersicum", probability)),
                Script::Empty => Ok(RawProviderResponse::PlantId(PlantIdResponse::default())),
                Script::Fail => Err(ProviderError::Status {
                    provider: self.kind,
                    status: 503,
                    body: "unavailable".to_string(),
                }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(answer("Too late", 0.99))
                }
            }
        }
    }

    fn slot(provider: &Arc<ScriptedProvider>) -> ProviderSlot {
        let provider: Arc<dyn IdentificationProvider> = provider.clone();
        ProviderSlot::new(provider, Duration::from_millis(50))
    }

    const IMAGE: &[u8] = b"jpeg-bytes";

    #[tokio::test]
    async fn primary_above_threshold_wins_without_calling_secondary() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Answer(0.9));
        let secondary = ScriptedProvider::new(ProviderKind::PlantNet, Script::Answer(0.95));
        let selector =
            FallbackSelector::new(vec![slot(&primary), slot(&secondary)], 0.3).expect("selector");

        let selection = selector.select(IMAGE, "corr-1").await.expect("selection");

        assert_eq!(selection.result.source_service, "plant_id");
        assert!(!selection.result.fallback_used);
        assert_eq!(secondary.calls(), 0);
        assert_eq!(selection.attempts.len(), 1);
        assert_eq!(selection.answered_by(), Some(ProviderKind::PlantId));
    }

    #[tokio::test]
    async fn low_confidence_primary_falls_back_to_secondary() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Answer(0.2));
        let secondary = ScriptedProvider::new(ProviderKind::PlantNet, Script::Answer(0.75));
        let selector =
            FallbackSelector::new(vec![slot(&primary), slot(&secondary)], 0.3).expect("selector");

        let selection = selector.select(IMAGE, "corr-2").await.expect("selection");

        assert_eq!(selection.result.source_service, "plantnet");
        assert!(selection.result.fallback_used);
        assert!((selection.result.top_confidence() - 0.75).abs() < f64::EPSILON);
        assert_eq!(selection.attempts[0].outcome, AttemptOutcome::LowConfidence { confidence: 0.2 });
        assert_eq!(selection.attempts[1].outcome, AttemptOutcome::Accepted { confidence: 0.75 });
        assert!(selection.error.is_none());
    }

    #[tokio::test]
    async fn failing_and_hanging_providers_are_skipped() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Hang);
        let secondary = ScriptedProvider::new(ProviderKind::PlantNet, Script::Fail);
        let third = ScriptedProvider::new(ProviderKind::PlantId, Script::Answer(0.6));
        let selector =
            FallbackSelector::new(vec![slot(&primary), slot(&secondary), slot(&third)], 0.3)
                .expect("selector");

        let selection = selector.select(IMAGE, "corr-3").await.expect("selection");

        assert!(matches!(selection.attempts[0].outcome, AttemptOutcome::TimedOut { timeout_ms: 50 }));
        assert!(matches!(selection.attempts[1].outcome, AttemptOutcome::Failed { .. }));
        assert!(selection.attempts[2].outcome.is_answer());
        assert!(selection.result.fallback_used);
        assert_eq!(selection.result.source_service, "plant_id");
    }

    #[tokio::test]
    async fn no_adequate_answer_returns_last_answer_received() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Answer(0.25));
        let secondary = ScriptedProvider::new(ProviderKind::PlantNet, Script::Fail);
        let selector =
            FallbackSelector::new(vec![slot(&primary), slot(&secondary)], 0.3).expect("selector");

        let selection = selector.select(IMAGE, "corr-4").await.expect("selection");

        assert_eq!(selection.result.source_service, "plant_id");
        assert!(!selection.result.fallback_used);
        assert!((selection.result.top_confidence() - 0.25).abs() < f64::EPSILON);
        assert!(selection.error.is_none());
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn empty_answer_is_never_accepted() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Empty);
        let secondary = ScriptedProvider::new(ProviderKind::PlantNet, Script::Answer(0.5));
        let selector =
            FallbackSelector::new(vec![slot(&primary), slot(&secondary)], 0.0).expect("selector");

        let selection = selector.select(IMAGE, "corr-5").await.expect("selection");

        assert_eq!(selection.result.source_service, "plantnet");
        assert_eq!(selection.attempts[0].outcome, AttemptOutcome::LowConfidence { confidence: 0.0 });
    }

    #[tokio::test]
    async fn all_providers_failing_yields_empty_result_with_error() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Fail);
        let secondary = ScriptedProvider::new(ProviderKind::PlantNet, Script::Hang);
        let selector =
            FallbackSelector::new(vec![slot(&primary), slot(&secondary)], 0.3).expect("selector");

        let selection = selector.select(IMAGE, "corr-6").await.expect("selection");

        assert!(selection.result.is_empty());
        assert_eq!(selection.result.source_service, "plantnet");
        assert!(selection.result.fallback_used);
        assert_eq!(selection.error, Some(SelectionError::AllProvidersFailed { attempts: 2 }));
        assert_eq!(selection.answered_by(), None);
    }

    #[tokio::test]
    async fn empty_image_fails_fast() {
        let primary = ScriptedProvider::new(ProviderKind::PlantId, Script::Answer(0.9));
        let selector = FallbackSelector::new(vec![slot(&primary)], 0.3).expect("selector");

        let result = selector.select(&[], "corr-7").await;

        assert_eq!(result.err(), Some(SelectionError::EmptyImage));
        assert_eq!(primary.calls(), 0);
    }

    #[test]
    fn selector_requires_at_least_one_provider() {
        assert_eq!(FallbackSelector::new(Vec::new(), 0.3).err(), Some(SelectionError::NoProviders));
    }
}
