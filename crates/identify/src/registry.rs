use std::sync::Arc;
use std::time::Duration;

use greenmatch_core::config::AppConfig;
use greenmatch_core::errors::ApplicationError;
use greenmatch_core::identification::ProviderKind;
use tracing::warn;

use crate::errors::{ProviderError, SelectionError};
use crate::fallback::{FallbackSelector, ProviderSlot};
use crate::plant_id::PlantIdClient;
use crate::plantnet::PlantNetClient;
use crate::provider::IdentificationProvider;

/// Builds one slot per configured provider, in configured order.
///
/// Providers that cannot be constructed (usually a missing API key) are
/// skipped and logged; the remaining order is preserved.
pub fn build_providers(config: &AppConfig) -> Vec<ProviderSlot> {
    config
        .identification
        .providers
        .iter()
        .filter_map(|kind| match build_provider(config, *kind) {
            Ok(slot) => Some(slot),
            Err(error) => {
                warn!(
                    event_name = "identify.provider.skipped",
                    provider = kind.id(),
                    error = %error,
                    "identification provider skipped"
                );
                None
            }
        })
        .collect()
}

pub fn build_selector(config: &AppConfig) -> Result<FallbackSelector, ApplicationError> {
    let slots = build_providers(config);
    FallbackSelector::new(slots, config.identification.min_confidence).map_err(|error| match error {
        SelectionError::NoProviders => ApplicationError::Configuration(
            "no identification provider has an API key; set GREENMATCH_PLANT_ID_API_KEY or \
             GREENMATCH_PLANTNET_API_KEY"
                .to_string(),
        ),
        other => other.into(),
    })
}

fn build_provider(config: &AppConfig, kind: ProviderKind) -> Result<ProviderSlot, ProviderError> {
    let api_key = config.provider_api_key(kind).cloned().ok_or_else(|| {
        ProviderError::NotConfigured { provider: kind, reason: "api key is not set".to_string() }
    })?;
    let timeout = Duration::from_secs(config.provider_timeout_secs(kind));

    let provider: Arc<dyn IdentificationProvider> = match kind {
        ProviderKind::PlantId => {
            Arc::new(PlantIdClient::new(api_key, &config.plant_id.base_url, timeout)?)
        }
        ProviderKind::PlantNet => Arc::new(PlantNetClient::new(
            api_key,
            &config.plantnet.base_url,
            &config.plantnet.project,
            &config.plantnet.organ,
            timeout,
        )?),
    };

    Ok(ProviderSlot::new(provider, timeout))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use greenmatch_core::config::AppConfig;
    use greenmatch_core::errors::ApplicationError;
    use greenmatch_core::identification::ProviderKind;

    use super::{build_providers, build_selector};

    fn key(value: &str) -> Option<secrecy::SecretString> {
        Some(value.to_string().into())
    }

    #[test]
    fn providers_follow_configured_order() {
        let mut config = AppConfig::default();
        config.identification.providers = vec![ProviderKind::PlantNet, ProviderKind::PlantId];
        config.plant_id.api_key = key("pid-key");
        config.plantnet.api_key = key("pn-key");
        config.plantnet.timeout_secs = 7;

        let slots = build_providers(&config);
        let kinds: Vec<ProviderKind> = slots.iter().map(|slot| slot.kind()).collect();

        assert_eq!(kinds, vec![ProviderKind::PlantNet, ProviderKind::PlantId]);
        assert_eq!(slots[0].timeout(), Duration::from_secs(7));
    }

    #[test]
    fn providers_without_keys_are_skipped() {
        let mut config = AppConfig::default();
        config.plantnet.api_key = key("pn-key");
        config.plant_id.api_key = key("   ");

        let selector = build_selector(&config).expect("plantnet remains");

        assert_eq!(selector.slots().len(), 1);
        assert_eq!(selector.slots()[0].kind(), ProviderKind::PlantNet);
    }

    #[test]
    fn selector_without_any_key_is_a_configuration_error() {
        let result = build_selector(&AppConfig::default());
        assert!(matches!(result, Err(ApplicationError::Configuration(_))));
    }
}
