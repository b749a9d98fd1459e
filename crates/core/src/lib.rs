pub mod config;
pub mod domain;
pub mod errors;
pub mod identification;
pub mod matching;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::identification::{IdentificationCandidate, IdentificationResult};
pub use domain::listing::{Catalog, CatalogListing, ListingId, ListingStatus, SellerId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use identification::{normalize_response, ProviderKind, RawProviderResponse};
pub use matching::{
    build_recommendations, AliasTable, CropMatchService, FuzzyMatcher, MatchCandidate,
    MatchOutcome, MatchTier, Recommendation, RecommendationTier,
};
