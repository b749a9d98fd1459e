//! Fuzzy crop matching: name normalization, alias boosting, tiered scoring
//! and recommendations.

pub mod alias;
pub mod matcher;
pub mod name;
pub mod recommend;
pub mod service;
pub mod tier;

pub use alias::{AliasEntry, AliasSnapshot, AliasTable, ALIAS_BOOST};
pub use matcher::{
    similarity, ComponentScores, FuzzyMatcher, MatchCandidate, MatchReport, DEFAULT_THRESHOLD,
};
pub use name::normalize;
pub use recommend::{build_recommendations, Recommendation, RecommendationTier};
pub use service::{CropMatchService, MatchOutcome};
pub use tier::MatchTier;
