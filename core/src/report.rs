//! Flat, serializable report rows for export.
//!
//! Presentation and export formatting live outside the core; these rows
//! are the tabular contract it consumes. Everything derives `Serialize`,
//! `Deserialize`, and `PartialEq` so an exported listing re-imported from
//! JSON reproduces member counts and risk tiers bit-for-bit, with no
//! recomputation drift.

use crate::pipeline::PipelineReport;
use crate::risk::RiskTier;
use crate::types::{ClusterId, RetailerId};
use serde::{Deserialize, Serialize};

/// One line of the cluster listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummaryRow {
    pub cluster_id: ClusterId,
    pub member_count: usize,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub max_name_similarity: f64,
    pub trader_count: usize,
    pub phone_duplicate_pairs: usize,
}

/// One member of a selected cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRow {
    pub cluster_id: ClusterId,
    pub retailer_id: RetailerId,
    pub retailer_name: String,
    pub retailer_phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub visit_count: usize,
    /// Distinct trader ids, ';'-joined for flat export.
    pub traders: String,
    /// Distinct darkstore labels, ';'-joined for flat export.
    pub darkstores: String,
    /// Opaque image references from the latest visit, when recorded.
    pub selfie: Option<String>,
    pub verification_doc: Option<String>,
}

/// One similarity-matrix entry of a selected cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub cluster_id: ClusterId,
    pub retailer_a: RetailerId,
    pub retailer_b: RetailerId,
    pub name_similarity: f64,
    pub phone_match: bool,
    /// Haversine distance between the pair, in meters.
    pub distance_m: f64,
}

/// Build the cluster listing from a finished run.
pub fn cluster_summary_rows(report: &PipelineReport) -> Vec<ClusterSummaryRow> {
    report
        .clusters
        .iter()
        .map(|ec| ClusterSummaryRow {
            cluster_id: ec.cluster.id,
            member_count: ec.cluster.member_count(),
            centroid_lat: ec.cluster.centroid.lat,
            centroid_lon: ec.cluster.centroid.lon,
            risk_score: ec.risk.score,
            risk_tier: ec.risk.tier,
            max_name_similarity: ec.similarity.max_name_similarity,
            trader_count: ec.risk.trader_count,
            phone_duplicate_pairs: ec.similarity.phone_duplicate_pairs,
        })
        .collect()
}

/// Build the member list for one cluster id, empty when unknown.
pub fn member_rows(report: &PipelineReport, cluster_id: ClusterId) -> Vec<MemberRow> {
    let Some(enriched) = report.clusters.iter().find(|ec| ec.cluster.id == cluster_id) else {
        return Vec::new();
    };
    enriched
        .cluster
        .members
        .iter()
        .map(|&i| {
            let r = &report.retailers[i];
            MemberRow {
                cluster_id,
                retailer_id: r.id.clone(),
                retailer_name: r.name.clone(),
                retailer_phone: r.phone.clone(),
                latitude: r.position.lat,
                longitude: r.position.lon,
                visit_count: r.visit_count,
                traders: join_set(&r.traders),
                darkstores: join_set(&r.darkstores),
                selfie: r.selfie.clone(),
                verification_doc: r.verification_doc.clone(),
            }
        })
        .collect()
}

/// Build the similarity matrix rows for one cluster id.
pub fn similarity_rows(report: &PipelineReport, cluster_id: ClusterId) -> Vec<SimilarityRow> {
    let Some(enriched) = report.clusters.iter().find(|ec| ec.cluster.id == cluster_id) else {
        return Vec::new();
    };
    enriched
        .similarity
        .pairs
        .iter()
        .map(|p| SimilarityRow {
            cluster_id,
            retailer_a: p.retailer_a.clone(),
            retailer_b: p.retailer_b.clone(),
            name_similarity: p.name_similarity,
            phone_match: p.phone_match,
            distance_m: p.distance_m,
        })
        .collect()
}

fn join_set(values: &std::collections::BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(";")
}
