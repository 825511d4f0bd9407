//! Cluster fraud-risk scoring.
//!
//! A pure, deterministic function of the cluster, its members, the
//! similarity matrix, and the configured weights: identical inputs always
//! produce an identical assessment, which investigation reports depend
//! on. Four additive factors, clamped to [0, 100]:
//!   1. member count (monotone, capped)
//!   2. trader concentration (all members registered by one trader)
//!   3. fuzzy name similarity above the configured threshold
//!   4. any phone-duplicate pair

use crate::cluster::Cluster;
use crate::config::{PipelineConfig, RiskWeights};
use crate::normalize::Retailer;
use crate::similarity::SimilarityMatrix;
use crate::types::TraderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixed tier mapping: >= 60 High, >= 30 Medium, otherwise Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_score(score: f64) -> RiskTier {
        if score >= 60.0 {
            RiskTier::High
        } else if score >= 30.0 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        };
        write!(f, "{label}")
    }
}

/// Per-factor contribution breakdown, in points on the 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub member_count_points: f64,
    pub trader_concentration_points: f64,
    pub name_similarity_points: f64,
    pub phone_duplicate_points: f64,
}

/// The risk assessment attached to a cluster. Recomputed wholesale when
/// scoring parameters change; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub tier: RiskTier,
    pub factors: RiskFactors,
    /// Number of distinct traders across all member retailers.
    pub trader_count: usize,
}

/// Score one cluster.
pub fn assess_cluster(
    cluster: &Cluster,
    retailers: &[Retailer],
    similarity: &SimilarityMatrix,
    config: &PipelineConfig,
) -> RiskAssessment {
    let weights = &config.weights;
    let member_count = cluster.member_count();

    let traders: BTreeSet<&TraderId> = cluster
        .members
        .iter()
        .flat_map(|&i| retailers[i].traders.iter())
        .collect();

    let factors = RiskFactors {
        member_count_points: member_count_points(member_count, weights),
        trader_concentration_points: if traders.len() == 1 {
            weights.single_trader_points
        } else {
            0.0
        },
        name_similarity_points: (similarity.similar_name_pairs(config.name_similarity_threshold)
            as f64
            * weights.similar_name_pair_points)
            .min(weights.similar_name_cap),
        phone_duplicate_points: if similarity.phone_duplicate_pairs > 0 {
            weights.phone_duplicate_points
        } else {
            0.0
        },
    };

    let score = (factors.member_count_points
        + factors.trader_concentration_points
        + factors.name_similarity_points
        + factors.phone_duplicate_points)
        .clamp(0.0, 100.0);

    RiskAssessment {
        score,
        tier: RiskTier::from_score(score),
        factors,
        trader_count: traders.len(),
    }
}

/// More distinct retailers at one spot means more risk, up to a cap.
fn member_count_points(member_count: usize, weights: &RiskWeights) -> f64 {
    if member_count >= 5 {
        weights.member_points_large
    } else if member_count >= 3 {
        weights.member_points_small
    } else if member_count >= 2 {
        weights.member_points_pair
    } else {
        0.0
    }
}
