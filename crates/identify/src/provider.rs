use async_trait::async_trait;
use greenmatch_core::identification::{ProviderKind, RawProviderResponse};

use crate::errors::ProviderError;

/// One upstream identification service.
///
/// Implementations make exactly one attempt per call. Retries and timeouts
/// belong to [`FallbackSelector`](crate::fallback::FallbackSelector).
#[async_trait]
pub trait IdentificationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn identify(&self, image: &[u8]) -> Result<RawProviderResponse, ProviderError>;
}
