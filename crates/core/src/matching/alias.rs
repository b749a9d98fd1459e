//! Curated synonym table for plant names.
//!
//! Readers take an `Arc` snapshot and never block writers for longer than a
//! pointer swap; writers clone the current snapshot, apply their change, and
//! publish the new one. A reader therefore sees either the old or the new
//! synonym set for an entry, never a half-written one.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::name::normalize;
use crate::errors::DomainError;

/// Score awarded when two names share an alias entry.
pub const ALIAS_BOOST: f64 = 0.9;

/// One canonical common name and the names that mean the same plant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    #[serde(rename = "canonical")]
    pub canonical_name: String,
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
}

impl AliasEntry {
    pub fn new<I, S>(canonical_name: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical_name: canonical_name.into(),
            synonyms: synonyms.into_iter().map(Into::into).collect(),
        }
    }
}

const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("tomato", &["solanum lycopersicum", "lycopersicon esculentum", "lycopersicon lycopersicum"]),
    ("potato", &["solanum tuberosum", "spud"]),
    ("rose", &["rosa", "rosa rubiginosa", "rosa canina", "sweet briar", "eglantine"]),
    ("banana", &["musa", "musa acuminata", "musa paradisiaca", "plantain"]),
    ("basil", &["ocimum basilicum", "ocimum"]),
    ("mint", &["mentha", "mentha spicata", "peppermint", "spearmint"]),
    ("chili pepper", &["capsicum annuum", "capsicum", "chilli", "cayenne"]),
    ("strawberry", &["fragaria", "fragaria ananassa", "fragaria vesca"]),
    ("lettuce", &["lactuca sativa", "romaine"]),
    ("sunflower", &["helianthus annuus", "helianthus"]),
    ("lavender", &["lavandula", "lavandula angustifolia"]),
    ("apple", &["malus domestica", "malus pumila", "malus"]),
    ("mango", &["mangifera indica"]),
    ("cucumber", &["cucumis sativus"]),
    ("eggplant", &["solanum melongena", "aubergine", "brinjal"]),
    ("pumpkin", &["cucurbita pepo", "cucurbita maxima", "squash"]),
    ("corn", &["zea mays", "maize"]),
    ("rice", &["oryza sativa", "paddy"]),
    ("wheat", &["triticum aestivum", "triticum"]),
    ("coffee", &["coffea arabica", "coffea canephora", "coffea"]),
    ("tea", &["camellia sinensis"]),
];

/// Built-in curated alias entries.
pub fn builtin_entries() -> Vec<AliasEntry> {
    BUILTIN_ALIASES
        .iter()
        .map(|(canonical, synonyms)| AliasEntry::new(*canonical, synonyms.iter().copied()))
        .collect()
}

/// Immutable view of the table at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasSnapshot {
    // normalized canonical name -> normalized synonyms
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl AliasSnapshot {
    fn from_entries(entries: Vec<AliasEntry>) -> Result<Self, DomainError> {
        let mut snapshot = Self::default();
        for entry in entries {
            snapshot.merge(&entry.canonical_name, entry.synonyms.iter())?;
        }
        Ok(snapshot)
    }

    fn merge<'a, I>(&mut self, canonical_name: &str, synonyms: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let canonical = normalize(canonical_name);
        if canonical.is_empty() {
            return Err(DomainError::InvalidAliasEntry {
                canonical: canonical_name.to_string(),
                reason: "canonical name is empty after normalization".to_string(),
            });
        }

        let mut normalized = BTreeSet::new();
        for synonym in synonyms {
            let value = normalize(synonym);
            if value.is_empty() {
                return Err(DomainError::InvalidAliasEntry {
                    canonical: canonical_name.to_string(),
                    reason: format!("synonym `{synonym}` is empty after normalization"),
                });
            }
            normalized.insert(value);
        }

        self.entries.entry(canonical).or_default().extend(normalized);
        Ok(())
    }

    /// Canonical names whose terms contain `name` or are contained in it,
    /// compared on whole-word boundaries.
    fn resolve<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(canonical, synonyms)| {
                std::iter::once(*canonical)
                    .chain(synonyms.iter())
                    .any(|term| contains_words(name, term) || contains_words(term, name))
            })
            .map(|(canonical, _)| canonical.as_str())
    }

    /// [`ALIAS_BOOST`] when both names resolve into the same entry, else `0.0`.
    pub fn score(&self, name_a: &str, name_b: &str) -> f64 {
        let left = normalize(name_a);
        let right = normalize(name_b);
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let left_entries: BTreeSet<&str> = self.resolve(&left).collect();
        if left_entries.is_empty() {
            return 0.0;
        }

        if self.resolve(&right).any(|canonical| left_entries.contains(canonical)) {
            ALIAS_BOOST
        } else {
            0.0
        }
    }

    pub fn synonyms(&self, canonical_name: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&normalize(canonical_name))
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process-wide alias configuration, safe to update while matches are in flight.
#[derive(Debug, Default)]
pub struct AliasTable {
    current: RwLock<Arc<AliasSnapshot>>,
}

impl AliasTable {
    pub fn new(entries: Vec<AliasEntry>) -> Result<Self, DomainError> {
        let snapshot = AliasSnapshot::from_entries(entries)?;
        Ok(Self { current: RwLock::new(Arc::new(snapshot)) })
    }

    pub fn with_builtin() -> Result<Self, DomainError> {
        Self::new(builtin_entries())
    }

    /// Current consistent view; later updates do not affect it.
    pub fn snapshot(&self) -> Arc<AliasSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn score_alias(&self, name_a: &str, name_b: &str) -> f64 {
        self.snapshot().score(name_a, name_b)
    }

    /// Unions `synonyms` into the entry for `canonical_name`, creating it when
    /// missing. Existing synonyms are never removed.
    pub fn add_aliases<I, S>(&self, canonical_name: &str, synonyms: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let additions: Vec<String> = synonyms.into_iter().map(Into::into).collect();
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = AliasSnapshot::clone(&guard);
        next.merge(canonical_name, additions.iter())?;
        *guard = Arc::new(next);

        info!(
            event_name = "alias.table.extended",
            canonical = canonical_name,
            added = additions.len(),
            "alias entry extended"
        );
        Ok(())
    }

    /// Replaces the whole table. Intended for reloading configuration between requests.
    pub fn reload(&self, entries: Vec<AliasEntry>) -> Result<(), DomainError> {
        let next = AliasSnapshot::from_entries(entries)?;
        let entry_count = next.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        info!(event_name = "alias.table.reloaded", entries = entry_count, "alias table reloaded");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AliasFile {
    #[serde(default)]
    alias: Vec<AliasEntry>,
}

/// Parses a TOML alias document (`[[alias]] canonical = "..." synonyms = [...]`)
/// and validates every entry.
pub fn parse_alias_toml(raw: &str) -> Result<Vec<AliasEntry>, DomainError> {
    let file: AliasFile = toml::from_str(raw)
        .map_err(|error| DomainError::InvalidInput(format!("alias file is malformed: {error}")))?;

    AliasSnapshot::from_entries(file.alias.clone())?;
    Ok(file.alias)
}

pub fn load_alias_file(path: &Path) -> Result<Vec<AliasEntry>, DomainError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        DomainError::InvalidInput(format!(
            "could not read alias file `{}`: {error}",
            path.display()
        ))
    })?;
    parse_alias_toml(&raw)
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}
