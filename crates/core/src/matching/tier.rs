use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of each tier. Every classification goes through
/// [`MatchTier::from_score`], so these are the only tier boundaries.
pub const EXACT_MIN: f64 = 0.95;
pub const STRONG_MIN: f64 = 0.80;
pub const GOOD_MIN: f64 = 0.60;
pub const WEAK_MIN: f64 = 0.50;

/// Discrete confidence bucket for a similarity score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Strong,
    Good,
    Weak,
    /// Below [`WEAK_MIN`]; only reachable when a caller lowers the threshold.
    Poor,
}

impl MatchTier {
    /// Tiers in recommendation priority order.
    pub const ALL: [MatchTier; 5] =
        [MatchTier::Exact, MatchTier::Strong, MatchTier::Good, MatchTier::Weak, MatchTier::Poor];

    pub fn from_score(score: f64) -> Self {
        if score >= EXACT_MIN {
            MatchTier::Exact
        } else if score >= STRONG_MIN {
            MatchTier::Strong
        } else if score >= GOOD_MIN {
            MatchTier::Good
        } else if score >= WEAK_MIN {
            MatchTier::Weak
        } else {
            MatchTier::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Strong => "strong",
            MatchTier::Good => "good",
            MatchTier::Weak => "weak",
            MatchTier::Poor => "poor",
        }
    }

    /// Whether a buyer can act on this tier without double-checking the listing.
    pub fn is_confident(&self) -> bool {
        matches!(self, MatchTier::Exact | MatchTier::Strong)
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchTier, EXACT_MIN, GOOD_MIN, STRONG_MIN, WEAK_MIN};

    #[test]
    fn boundaries_are_inclusive_lower_bounds() {
        assert_eq!(MatchTier::from_score(1.0), MatchTier::Exact);
        assert_eq!(MatchTier::from_score(EXACT_MIN), MatchTier::Exact);
        assert_eq!(MatchTier::from_score(0.9499), MatchTier::Strong);
        assert_eq!(MatchTier::from_score(STRONG_MIN), MatchTier::Strong);
        assert_eq!(MatchTier::from_score(0.7999), MatchTier::Good);
        assert_eq!(MatchTier::from_score(GOOD_MIN), MatchTier::Good);
        assert_eq!(MatchTier::from_score(0.5999), MatchTier::Weak);
        assert_eq!(MatchTier::from_score(WEAK_MIN), MatchTier::Weak);
        assert_eq!(MatchTier::from_score(0.4999), MatchTier::Poor);
        assert_eq!(MatchTier::from_score(0.0), MatchTier::Poor);
    }

    #[test]
    fn tiers_partition_the_unit_interval() {
        let mut previous = MatchTier::Poor;
        for step in 0..=1000 {
            let tier = MatchTier::from_score(step as f64 / 1000.0);
            assert!(tier <= previous, "tiers must not regress as the score rises");
            previous = tier;
        }
        assert_eq!(previous, MatchTier::Exact);
    }

    #[test]
    fn only_exact_and_strong_are_confident() {
        let confident: Vec<MatchTier> =
            MatchTier::ALL.into_iter().filter(MatchTier::is_confident).collect();
        assert_eq!(confident, vec![MatchTier::Exact, MatchTier::Strong]);
    }
}
