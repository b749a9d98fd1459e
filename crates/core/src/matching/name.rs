//! Canonical form for free-text plant names.

/// Generic botanical words that carry no identity on their own.
pub const STOPWORDS: &[&str] = &["plant", "tree", "crop", "leaf", "flower", "fruit"];

/// Lowercases, strips everything except letters, digits and whitespace,
/// drops stopwords as whole words, and joins what remains with single spaces.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect();

    folded.split_whitespace().filter(|word| !STOPWORDS.contains(word)).collect::<Vec<_>>().join(" ")
}
