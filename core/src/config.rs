//! Pipeline parameters and risk-scoring weights.
//!
//! Everything here is validated up front: a bad parameter aborts the run
//! with `PipelineError::Configuration` before any record is touched.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// How the canonical name/phone/coordinate of a folded retailer is chosen
/// when the same retailer id appears across multiple visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalPolicy {
    /// Values from the chronologically last visit win; timestamp ties are
    /// broken by original input order (the later row wins). This is the
    /// default and matters downstream: name matching runs on the
    /// canonical values, so the policy must be deterministic.
    #[default]
    LatestVisit,
    /// The most frequently observed value wins; frequency ties are broken
    /// in favor of the chronologically later occurrence.
    MostFrequent,
}

/// Additive scoring weights used by the risk scorer. Each contribution is
/// expressed in points on the final 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Points for clusters of 2, 3-4, and 5+ unique retailers.
    pub member_points_pair: f64,
    pub member_points_small: f64,
    pub member_points_large: f64,
    /// Bonus when every member was registered by the same single trader.
    pub single_trader_points: f64,
    /// Points per member pair whose name similarity meets the threshold.
    pub similar_name_pair_points: f64,
    /// Cap on the total name-similarity contribution.
    pub similar_name_cap: f64,
    /// Flat bonus when any two members share a normalized phone number.
    pub phone_duplicate_points: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            member_points_pair: 10.0,
            member_points_small: 20.0,
            member_points_large: 30.0,
            single_trader_points: 25.0,
            similar_name_pair_points: 15.0,
            similar_name_cap: 30.0,
            phone_duplicate_points: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Clustering radius in meters. Two retailers are directly connected
    /// when their haversine distance is at most this value. Zero is
    /// permitted and clusters only exactly coincident coordinates.
    pub radius_meters: f64,
    /// Minimum unique retailers per cluster. Components below the
    /// threshold are reported as noise. A value of 1 does NOT create
    /// singleton clusters; the effective floor is 2 (see DESIGN.md).
    pub min_members: usize,
    /// Name-similarity percentage at which a pair starts contributing to
    /// the risk score. Range [0, 100].
    pub name_similarity_threshold: f64,
    pub canonical_policy: CanonicalPolicy,
    pub weights: RiskWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            radius_meters: 10.0,
            min_members: 2,
            name_similarity_threshold: 85.0,
            canonical_policy: CanonicalPolicy::default(),
            weights: RiskWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every parameter before the run starts.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.radius_meters.is_finite() || self.radius_meters < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "radius_meters must be finite and >= 0, got {}",
                self.radius_meters
            )));
        }
        if self.min_members < 1 {
            return Err(PipelineError::Configuration(
                "min_members must be >= 1".to_string(),
            ));
        }
        if !self.name_similarity_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.name_similarity_threshold)
        {
            return Err(PipelineError::Configuration(format!(
                "name_similarity_threshold must be within [0, 100], got {}",
                self.name_similarity_threshold
            )));
        }
        Ok(())
    }

    /// Clusters always need at least two members to be meaningful; a
    /// configured minimum of 1 still excludes singletons.
    pub fn effective_min_members(&self) -> usize {
        self.min_members.max(2)
    }
}
