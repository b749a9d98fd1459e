use std::sync::Arc;

use greenmatch_core::domain::listing::{Catalog, CatalogListing, ListingId, ListingStatus, SellerId};
use greenmatch_core::identification::raw::PlantNetResponse;
use greenmatch_core::identification::{normalize_response, RawProviderResponse};
use greenmatch_core::matching::{
    normalize, similarity, AliasTable, CropMatchService, FuzzyMatcher, MatchTier,
    RecommendationTier, DEFAULT_THRESHOLD,
};
use rust_decimal::Decimal;

fn listing(id: &str, plant_name: &str, scientific_name: Option<&str>, quantity: u32) -> CatalogListing {
    CatalogListing {
        id: ListingId(id.to_string()),
        seller_id: SellerId("seller-1".to_string()),
        plant_name: plant_name.to_string(),
        scientific_name: scientific_name.map(str::to_string),
        quantity,
        price: Decimal::new(995, 2),
        status: ListingStatus::Active,
    }
}

fn matcher() -> FuzzyMatcher {
    FuzzyMatcher::new(Arc::new(AliasTable::with_builtin().expect("builtin aliases load")))
}

fn service() -> CropMatchService {
    CropMatchService::new(matcher(), DEFAULT_THRESHOLD).expect("default threshold is valid")
}

#[test]
fn plantnet_answer_matches_wild_rose_exactly() {
    let raw: PlantNetResponse = serde_json::from_str(
        r#"{
            "bestMatch": "Rosa rubiginosa L.",
            "results": [
                {"score": 0.75, "species": {
                    "scientificNameWithoutAuthor": "Rosa rubiginosa",
                    "genus": {"scientificNameWithoutAuthor": "Rosa"},
                    "family": {"scientificNameWithoutAuthor": "Rosaceae"},
                    "commonNames": ["Sweet-brier"]
                }}
            ]
        }"#,
    )
    .expect("fixture decodes");
    let identification = normalize_response(&RawProviderResponse::PlantNet(raw));
    let catalog = Catalog::new(vec![
        listing("rose", "Wild Rose", Some("Rosa rubiginosa"), 5),
        listing("banana", "Banana", None, 3),
    ]);

    let outcome = service().run(&identification, &catalog);

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].listing.id.0, "rose");
    assert_eq!(outcome.matches[0].tier, MatchTier::Exact);
    assert!((outcome.matches[0].component_scores.scientific_name_score - 1.0).abs() < f64::EPSILON);
    assert_eq!(outcome.recommendations.len(), 1);
    assert_eq!(outcome.recommendations[0].tier, RecommendationTier::Exact);
}

#[test]
fn empty_catalog_yields_only_the_none_recommendation() {
    let catalog = Catalog::new(Vec::new());

    for name in ["Rosa rubiginosa", "tomato", "", "!!!"] {
        let outcome = service().match_name(name, &catalog);
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.recommendations.len(), 1);
        assert_eq!(outcome.recommendations[0].tier, RecommendationTier::None);
        assert!(outcome.recommendations[0].listings.is_empty());
    }
}

#[test]
fn alias_recovers_tomato_against_latin_listing() {
    let listings = vec![listing("tom", "Lycopersicon esculentum", None, 4)];

    let matches = matcher().find_matches("tomato", &listings, DEFAULT_THRESHOLD);

    assert_eq!(matches.len(), 1);
    let found = &matches[0];
    assert!(found.component_scores.name_score < DEFAULT_THRESHOLD);
    assert!((found.component_scores.alias_score - 0.9).abs() < f64::EPSILON);
    assert_eq!(found.tier, MatchTier::Strong);
}

#[test]
fn alias_boost_is_symmetric() {
    let aliases = AliasTable::with_builtin().expect("builtin aliases load");
    let forward = aliases.score_alias("tomato", "lycopersicon esculentum");
    let backward = aliases.score_alias("lycopersicon esculentum", "tomato");
    assert!((forward - backward).abs() < f64::EPSILON);
    assert!(forward > 0.0);
}

#[test]
fn listing_appears_iff_best_score_reaches_threshold() {
    let listings = vec![
        listing("a", "Tomato", None, 1),
        listing("b", "Tomatillo", None, 1),
        listing("c", "Cherry tomatoes", Some("Solanum lycopersicum"), 1),
        listing("d", "Potato", Some("Solanum tuberosum"), 1),
        listing("e", "Aubergine", None, 1),
        listing("f", "Sweet basil plant", Some("Ocimum basilicum"), 1),
    ];
    let matcher = matcher();
    let snapshot = matcher.aliases().snapshot();

    for threshold in [0.1, 0.3, 0.5, 0.6, 0.8, 0.95, 1.0] {
        let found = matcher.find_matches("Tomato", &listings, threshold);
        for candidate in &listings {
            let best = greenmatch_core::matching::matcher::score_listing(&snapshot, "Tomato", candidate)
                .map(|scores| scores.best())
                .unwrap_or(0.0);
            let present = found.iter().any(|hit| hit.listing.id == candidate.id);
            assert_eq!(present, best >= threshold, "listing {} at threshold {threshold}", candidate.id.0);
        }
        assert!(found.windows(2).all(|pair| pair[0].similarity >= pair[1].similarity));
    }
}

#[test]
fn every_match_has_the_tier_of_its_score() {
    let listings = vec![
        listing("a", "Mint", None, 1),
        listing("b", "Peppermint", None, 1),
        listing("c", "Spearmint", Some("Mentha spicata"), 1),
        listing("d", "Mind", None, 1),
    ];

    for hit in matcher().find_matches("mint", &listings, 0.1) {
        assert_eq!(hit.tier, MatchTier::from_score(hit.similarity));
        assert!((0.0..=1.0).contains(&hit.similarity));
    }
}

#[test]
fn normalization_is_idempotent_and_similarity_is_bounded() {
    let samples = [
        "Tomato Plant",
        "  Rosa   rubiginosa!! ",
        "LEAF lettuce",
        "Flower-of-the-day",
        "",
        "Tree tomato (Tamarillo)",
        "Çiçek bahçesi",
    ];

    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "normalize should be idempotent for {sample:?}");
        for other in samples {
            let score = similarity(&once, &normalize(other));
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
