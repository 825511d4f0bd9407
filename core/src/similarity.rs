//! Within-cluster similarity signals: fuzzy name matching and phone
//! duplicates.
//!
//! Name similarity is Jaro-Winkler over token-sorted, normalized names,
//! scaled to [0, 100] — tolerant of word reordering ("Traders Raj" vs
//! "Raj Traders"), casing, and minor spelling variance. Phone matching
//! compares digit-normalized numbers for exact equality.
//!
//! Pure functions, O(n²) per cluster. Clusters are small by construction
//! (tens of members); a pathological giant cluster still terminates, just
//! slowly.

use crate::cluster::Cluster;
use crate::normalize::Retailer;
use crate::types::RetailerId;
use serde::{Deserialize, Serialize};

/// Similarity signals for one unordered pair of cluster members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub retailer_a: RetailerId,
    pub retailer_b: RetailerId,
    /// Name similarity percentage in [0, 100].
    pub name_similarity: f64,
    /// True when the two digit-normalized phone numbers are identical.
    pub phone_match: bool,
    /// Haversine distance between the two members, in meters.
    pub distance_m: f64,
}

/// Symmetric pairwise similarity for one cluster, plus the aggregates the
/// risk scorer consumes. Computed lazily per cluster, never persisted
/// globally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    pub pairs: Vec<SimilarityPair>,
    pub max_name_similarity: f64,
    pub avg_name_similarity: f64,
    pub phone_duplicate_pairs: usize,
}

impl SimilarityMatrix {
    /// Compute all unordered member pairs of a cluster.
    pub fn compute(cluster: &Cluster, retailers: &[Retailer]) -> SimilarityMatrix {
        let mut matrix = SimilarityMatrix::default();

        for (pos, &i) in cluster.members.iter().enumerate() {
            for &j in &cluster.members[pos + 1..] {
                let a = &retailers[i];
                let b = &retailers[j];
                let name_similarity = name_similarity_pct(&a.name, &b.name);
                let phone_match = phones_match(&a.phone, &b.phone);
                if phone_match {
                    matrix.phone_duplicate_pairs += 1;
                }
                matrix.pairs.push(SimilarityPair {
                    retailer_a: a.id.clone(),
                    retailer_b: b.id.clone(),
                    name_similarity,
                    phone_match,
                    distance_m: a.position.distance_m(&b.position),
                });
            }
        }

        if !matrix.pairs.is_empty() {
            matrix.max_name_similarity = matrix
                .pairs
                .iter()
                .map(|p| p.name_similarity)
                .fold(0.0, f64::max);
            matrix.avg_name_similarity = matrix
                .pairs
                .iter()
                .map(|p| p.name_similarity)
                .sum::<f64>()
                / matrix.pairs.len() as f64;
        }

        matrix
    }

    /// Pairs at or above the given similarity threshold.
    pub fn similar_name_pairs(&self, threshold: f64) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.name_similarity >= threshold)
            .count()
    }
}

/// Name similarity percentage: Jaro-Winkler over token-sorted normalized
/// strings, scaled to [0, 100].
pub fn name_similarity_pct(a: &str, b: &str) -> f64 {
    let a = token_sort(a);
    let b = token_sort(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (strsim::jaro_winkler(&a, &b) * 100.0).min(100.0)
}

/// Lowercase, strip punctuation to spaces, and sort tokens so word order
/// never affects the score.
fn token_sort(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// True when both phones normalize to the same non-empty digit string.
pub fn phones_match(a: &str, b: &str) -> bool {
    let a = normalize_phone(a);
    let b = normalize_phone(b);
    !a.is_empty() && a == b
}

/// Normalize a phone number to bare national digits: strip everything
/// non-numeric, then a leading country prefix "91" on 12-digit numbers
/// and any leading zeros.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = if digits.len() == 12 && digits.starts_with("91") {
        digits[2..].to_string()
    } else {
        digits
    };
    digits.trim_start_matches('0').to_string()
}
