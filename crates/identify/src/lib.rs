//! Plant identification against upstream providers with ordered fallback.

pub mod errors;
pub mod fallback;
pub mod plant_id;
pub mod plantnet;
pub mod provider;
pub mod registry;

pub use errors::{ProviderError, SelectionError};
pub use fallback::{AttemptOutcome, FallbackSelector, ProviderAttempt, ProviderSlot, Selection};
pub use plant_id::PlantIdClient;
pub use plantnet::PlantNetClient;
pub use provider::IdentificationProvider;
pub use registry::{build_providers, build_selector};
