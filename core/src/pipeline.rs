//! End-to-end orchestration of the identity-resolution pipeline.
//!
//! Data flows strictly left to right over immutable generations:
//! raw rows -> validated records -> filtered records -> unique retailers
//! -> spatial clusters -> similarity + risk enrichment. A single
//! synchronous pass; no stage performs I/O once the raw rows are in
//! memory, and each run operates on its own snapshot of the input.

use crate::cluster::{cluster_retailers, Cluster};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::filter::RecordFilter;
use crate::normalize::{normalize, Retailer};
use crate::record::{validate_records, RawVisitRecord};
use crate::risk::{assess_cluster, RiskAssessment};
use crate::similarity::SimilarityMatrix;
use std::collections::BTreeMap;

/// A cluster together with its similarity matrix and risk assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedCluster {
    pub cluster: Cluster,
    pub similarity: SimilarityMatrix,
    pub risk: RiskAssessment,
}

/// How much of the uploaded data was actually analyzed. Surfaced with
/// every result so investigators can judge coverage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunDiagnostics {
    pub input_rows: usize,
    /// Rows surviving validation.
    pub valid_rows: usize,
    /// Rows dropped during validation, with per-reason counts.
    pub dropped_rows: usize,
    pub drop_reasons: BTreeMap<String, usize>,
    /// Rows remaining after the query filter, i.e. what was analyzed.
    pub analyzed_rows: usize,
}

/// The complete result of one pipeline run. Zero clusters is a valid,
/// reportable outcome, not an error.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Unique retailers in first-seen input order. Cluster members and
    /// the noise set index into this table.
    pub retailers: Vec<Retailer>,
    pub clusters: Vec<EnrichedCluster>,
    /// Retailer indices belonging to no cluster.
    pub noise: Vec<usize>,
    pub diagnostics: RunDiagnostics,
}

/// Run the full pipeline over an explicit input record set.
///
/// Configuration problems abort before any record is touched; per-row
/// data problems drop the row and complete the run with a diagnostic
/// count alongside the results.
pub fn run_pipeline(
    raw: &[RawVisitRecord],
    filter: &RecordFilter,
    config: &PipelineConfig,
) -> PipelineResult<PipelineReport> {
    config.validate()?;

    let validation = validate_records(raw)?;
    let filtered = filter.apply(&validation.records);
    let retailers = normalize(&filtered, config.canonical_policy);
    let outcome = cluster_retailers(&retailers, config);

    // Similarity and risk are independent per cluster; computed here in a
    // single pass since clusters are small by construction.
    let clusters: Vec<EnrichedCluster> = outcome
        .clusters
        .into_iter()
        .map(|cluster| {
            let similarity = SimilarityMatrix::compute(&cluster, &retailers);
            let risk = assess_cluster(&cluster, &retailers, &similarity, config);
            EnrichedCluster {
                cluster,
                similarity,
                risk,
            }
        })
        .collect();

    log::info!(
        "Pipeline run complete: {} clusters, {} noise retailers, {} rows dropped",
        clusters.len(),
        outcome.noise.len(),
        validation.dropped
    );

    Ok(PipelineReport {
        retailers,
        clusters,
        noise: outcome.noise,
        diagnostics: RunDiagnostics {
            input_rows: raw.len(),
            valid_rows: validation.records.len(),
            dropped_rows: validation.dropped,
            drop_reasons: validation.drop_reasons,
            analyzed_rows: filtered.len(),
        },
    })
}
