use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::alias::{builtin_entries, load_alias_file, AliasTable};
use super::matcher::{FuzzyMatcher, MatchCandidate, MatchReport};
use super::recommend::{build_recommendations, Recommendation};
use super::tier::MatchTier;
use crate::config::MatchingConfig;
use crate::domain::identification::IdentificationResult;
use crate::domain::listing::Catalog;
use crate::errors::DomainError;

/// Everything a caller needs to show the buyer after one identification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub identification: Option<IdentificationResult>,
    /// Name the recommendations talk about.
    pub plant_name: String,
    pub matches: Vec<MatchCandidate>,
    /// Match count per tier; tiers without matches are omitted.
    pub by_tier: BTreeMap<MatchTier, usize>,
    pub recommendations: Vec<Recommendation>,
}

/// Runs matching and recommendation for identified plants against the active catalog.
#[derive(Clone, Debug)]
pub struct CropMatchService {
    matcher: FuzzyMatcher,
    threshold: f64,
}

impl CropMatchService {
    pub fn new(matcher: FuzzyMatcher, threshold: f64) -> Result<Self, DomainError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(DomainError::InvalidInput(format!(
                "match threshold must be in (0, 1], got {threshold}"
            )));
        }
        Ok(Self { matcher, threshold })
    }

    /// Builds the service from the `[matching]` config section. Entries from
    /// `alias_file` are merged over the built-in table.
    pub fn from_config(matching: &MatchingConfig) -> Result<Self, DomainError> {
        let mut entries = builtin_entries();
        if let Some(path) = &matching.alias_file {
            entries.extend(load_alias_file(path)?);
        }
        let aliases = Arc::new(AliasTable::new(entries)?);
        Self::new(FuzzyMatcher::new(aliases), matching.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    /// Matches a name typed by the buyer (manual entry path).
    pub fn match_name(&self, plant_name: &str, catalog: &Catalog) -> MatchOutcome {
        let listings = catalog.active_listings();
        let matches = self.matcher.find_matches(plant_name, &listings, self.threshold);
        self.outcome(None, plant_name.trim().to_string(), matches)
    }

    /// Matches the top candidate of an identification, trying both its
    /// scientific name and its primary common name.
    pub fn run(&self, identification: &IdentificationResult, catalog: &Catalog) -> MatchOutcome {
        let Some(top) = identification.top() else {
            return self.outcome(Some(identification.clone()), String::new(), Vec::new());
        };

        let mut names: Vec<&str> = Vec::with_capacity(2);
        if !top.is_unknown_species() {
            names.push(&top.scientific_name);
        }
        if let Some(common) = top.primary_common_name() {
            names.push(common);
        }

        let listings = catalog.active_listings();
        let matches = self.matcher.find_matches_any(&names, &listings, self.threshold);
        let plant_name = top
            .primary_common_name()
            .filter(|_| top.is_unknown_species())
            .unwrap_or(top.scientific_name.as_str())
            .to_string();

        self.outcome(Some(identification.clone()), plant_name, matches)
    }

    fn outcome(
        &self,
        identification: Option<IdentificationResult>,
        plant_name: String,
        matches: Vec<MatchCandidate>,
    ) -> MatchOutcome {
        let report = MatchReport::new(matches);
        let recommendations = build_recommendations(&plant_name, report.matches());
        let by_tier = report.tier_counts();
        info!(
            event_name = "match.outcome.ready",
            plant_name = plant_name.as_str(),
            match_count = report.matches().len(),
            recommendation_count = recommendations.len(),
            top_tier = report.best().map(|candidate| candidate.tier.label()).unwrap_or("none"),
            "match outcome ready"
        );
        MatchOutcome {
            identification,
            plant_name,
            matches: report.into_matches(),
            by_tier,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::CropMatchService;
    use crate::config::MatchingConfig;
    use crate::domain::identification::{IdentificationCandidate, IdentificationResult};
    use crate::domain::listing::{Catalog, CatalogListing, ListingId, ListingStatus, SellerId};
    use crate::matching::alias::AliasTable;
    use crate::matching::matcher::{FuzzyMatcher, DEFAULT_THRESHOLD};
    use crate::matching::recommend::RecommendationTier;
    use crate::matching::tier::MatchTier;

    fn service() -> CropMatchService {
        let aliases = Arc::new(AliasTable::with_builtin().expect("builtin aliases"));
        CropMatchService::new(FuzzyMatcher::new(aliases), DEFAULT_THRESHOLD).expect("valid threshold")
    }

    fn listing(id: &str, name: &str, quantity: u32, status: ListingStatus) -> CatalogListing {
        CatalogListing {
            id: ListingId(id.to_string()),
            seller_id: SellerId("seller-1".to_string()),
            plant_name: name.to_string(),
            scientific_name: None,
            quantity,
            price: Decimal::new(300, 2),
            status,
        }
    }

    fn identification(scientific: &str, common: &[&str]) -> IdentificationResult {
        IdentificationResult::new(
            vec![IdentificationCandidate {
                scientific_name: scientific.to_string(),
                common_names: common.iter().map(|name| name.to_string()).collect(),
                family: "Solanaceae".to_string(),
                genus: "Solanum".to_string(),
                confidence: 0.8,
                rank: 1,
            }],
            "plant_id",
            false,
            Utc::now(),
        )
    }

    #[test]
    fn from_config_merges_alias_file_over_builtin() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("aliases.toml");
        std::fs::write(
            &path,
            "[[alias]]\ncanonical = \"tomato\"\nsynonyms = [\"pomodoro\"]\n",
        )
        .expect("write alias file");

        let service = CropMatchService::from_config(&MatchingConfig {
            threshold: 0.6,
            alias_file: Some(path),
        })
        .expect("service builds");

        let snapshot = service.matcher().aliases().snapshot();
        let synonyms = snapshot.synonyms("tomato").expect("tomato entry");
        assert!(synonyms.contains("pomodoro"));
        assert!(synonyms.contains("solanum lycopersicum"));
        assert!((service.threshold() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let aliases = Arc::new(AliasTable::default());
        for threshold in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(CropMatchService::new(FuzzyMatcher::new(Arc::clone(&aliases)), threshold)
                .is_err());
        }
    }

    #[test]
    fn run_matches_only_active_in_stock_listings() {
        let catalog = Catalog::new(vec![
            listing("l-1", "Tomato", 0, ListingStatus::Active),
            listing("l-2", "Tomato", 4, ListingStatus::Sold),
            listing("l-3", "Garden tomato", 2, ListingStatus::Active),
        ]);

        let outcome = service().run(&identification("Solanum lycopersicum", &["Tomato"]), &catalog);

        let ids: Vec<&str> = outcome.matches.iter().map(|found| found.listing.id.0.as_str()).collect();
        assert_eq!(ids, vec!["l-3"]);
        assert_eq!(outcome.by_tier.len(), 1);
        assert_eq!(outcome.by_tier.values().sum::<usize>(), outcome.matches.len());
        assert_eq!(outcome.plant_name, "Solanum lycopersicum");
        assert!(outcome.identification.is_some());
    }

    #[test]
    fn run_uses_common_name_when_it_scores_better() {
        let catalog = Catalog::new(vec![listing("l-1", "Tomato", 2, ListingStatus::Active)]);

        let outcome = service().run(&identification("Solanum lycopersicum", &["Tomato"]), &catalog);

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].tier, MatchTier::Exact);
        assert_eq!(outcome.recommendations[0].tier, RecommendationTier::Exact);
    }

    #[test]
    fn empty_identification_yields_none_recommendation() {
        let catalog = Catalog::new(vec![listing("l-1", "Tomato", 2, ListingStatus::Active)]);

        let outcome = service().run(&IdentificationResult::empty("plant_id", false), &catalog);

        assert!(outcome.matches.is_empty());
        assert!(outcome.by_tier.is_empty());
        assert_eq!(outcome.recommendations.len(), 1);
        assert_eq!(outcome.recommendations[0].tier, RecommendationTier::None);
    }

    #[test]
    fn unknown_species_falls_back_to_common_name() {
        let catalog = Catalog::new(vec![listing("l-1", "Basil", 2, ListingStatus::Active)]);

        let outcome = service().run(&identification("Unknown species", &["Basil"]), &catalog);

        assert_eq!(outcome.plant_name, "Basil");
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn manual_entry_matches_by_name() {
        let catalog = Catalog::new(vec![listing("l-1", "Aubergine", 2, ListingStatus::Active)]);

        let outcome = service().match_name(" Eggplant ", &catalog);

        assert_eq!(outcome.plant_name, "Eggplant");
        assert!(outcome.identification.is_none());
        assert_eq!(outcome.matches[0].tier, MatchTier::Strong);
        assert_eq!(outcome.by_tier.get(&MatchTier::Strong), Some(&1));
    }
}
