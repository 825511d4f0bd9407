//! End-to-end pipeline tests: configuration gating, diagnostics,
//! filtering, and export round-trips.

use storewatch_core::config::PipelineConfig;
use storewatch_core::error::PipelineError;
use storewatch_core::filter::RecordFilter;
use storewatch_core::pipeline::run_pipeline;
use storewatch_core::record::RawVisitRecord;
use storewatch_core::report::{cluster_summary_rows, member_rows, similarity_rows, ClusterSummaryRow};
use storewatch_core::risk::RiskTier;

/// One degree of latitude along a meridian under the haversine model.
const METERS_PER_LAT_DEGREE: f64 = 111_195.0;
const BASE_LAT: f64 = 12.9716;
const BASE_LON: f64 = 77.5946;

fn raw(
    retailer_id: &str,
    name: &str,
    phone: &str,
    trader_id: &str,
    darkstore: &str,
    date: &str,
    north_meters: f64,
) -> RawVisitRecord {
    RawVisitRecord {
        visit_date: Some(date.into()),
        darkstore: Some(darkstore.into()),
        trader_id: Some(trader_id.into()),
        trader_name: Some("Asha".into()),
        retailer_id: Some(retailer_id.into()),
        retailer_name: Some(name.into()),
        retailer_phone: Some(phone.into()),
        latitude: Some(BASE_LAT + north_meters / METERS_PER_LAT_DEGREE),
        longitude: Some(BASE_LON),
        ..Default::default()
    }
}

fn fake_account_rows() -> Vec<RawVisitRecord> {
    vec![
        // Two "different" retailers, same spot, same phone, same trader.
        raw("R1", "Raj Traders", "9876543210", "T-1", "DS-K", "2024-01-10 09:00:00", 0.0),
        raw("R2", "Raaj Traderss", "9876543210", "T-1", "DS-K", "2024-01-11 09:30:00", 4.0),
        // Repeat visit to R1; must fold into one identity.
        raw("R1", "Raj Traders", "9876543210", "T-1", "DS-K", "2024-02-01 10:00:00", 1.0),
        // A legitimate retailer far away.
        raw("R3", "Sunrise Electronics", "1112223334", "T-2", "DS-K", "2024-01-12 11:00:00", 5_000.0),
    ]
}

#[test]
fn fake_account_pattern_produces_one_high_risk_cluster() {
    let report = run_pipeline(
        &fake_account_rows(),
        &RecordFilter::default(),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(report.retailers.len(), 3, "3 unique retailer ids expected");
    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.noise.len(), 1);

    let enriched = &report.clusters[0];
    assert_eq!(enriched.cluster.member_count(), 2);
    assert_eq!(enriched.similarity.phone_duplicate_pairs, 1);
    assert!(enriched.similarity.max_name_similarity >= 85.0);
    assert_eq!(enriched.risk.tier, RiskTier::High);

    // R1 folded two visits; canonical coordinate comes from the later one.
    let r1 = report.retailers.iter().find(|r| r.id == "R1").unwrap();
    assert_eq!(r1.visit_count, 2);
    let expected_lat = BASE_LAT + 1.0 / METERS_PER_LAT_DEGREE;
    assert!((r1.position.lat - expected_lat).abs() < 1e-9);
}

#[test]
fn zero_clusters_is_a_valid_outcome() {
    let rows = vec![
        raw("R1", "Alpha Stores", "111", "T-1", "DS-K", "2024-01-10 09:00:00", 0.0),
        raw("R2", "Brightline Mart", "222", "T-2", "DS-K", "2024-01-11 09:00:00", 5_000.0),
    ];

    let report = run_pipeline(&rows, &RecordFilter::default(), &PipelineConfig::default()).unwrap();

    assert!(report.clusters.is_empty());
    assert_eq!(report.noise.len(), 2);
    assert!(cluster_summary_rows(&report).is_empty());
}

#[test]
fn invalid_configuration_aborts_before_any_work() {
    let rows = fake_account_rows();
    let filter = RecordFilter::default();

    for config in [
        PipelineConfig {
            radius_meters: -1.0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            radius_meters: f64::NAN,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            min_members: 0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            name_similarity_threshold: 101.0,
            ..PipelineConfig::default()
        },
    ] {
        let err = run_pipeline(&rows, &filter, &config).unwrap_err();
        assert!(
            matches!(err, PipelineError::Configuration(_)),
            "Expected Configuration error, got {err:?}"
        );
    }
}

#[test]
fn dropped_rows_are_reported_alongside_results() {
    let mut rows = fake_account_rows();
    let mut bad = raw("R9", "Ghost Shop", "999", "T-9", "DS-K", "2024-01-10 09:00:00", 0.0);
    bad.latitude = Some(400.0);
    rows.push(bad);

    let report = run_pipeline(&rows, &RecordFilter::default(), &PipelineConfig::default()).unwrap();

    assert_eq!(report.diagnostics.input_rows, 5);
    assert_eq!(report.diagnostics.valid_rows, 4);
    assert_eq!(report.diagnostics.dropped_rows, 1);
    assert_eq!(
        report.diagnostics.drop_reasons.get("invalid coordinate"),
        Some(&1)
    );
    // The bad row never becomes a retailer.
    assert!(report.retailers.iter().all(|r| r.id != "R9"));
}

#[test]
fn trader_filter_subsets_before_normalization() {
    let filter = RecordFilter {
        traders: Some(vec!["T-2".into()]),
        ..RecordFilter::default()
    };

    let report = run_pipeline(&fake_account_rows(), &filter, &PipelineConfig::default()).unwrap();

    assert_eq!(report.diagnostics.valid_rows, 4);
    assert_eq!(report.diagnostics.analyzed_rows, 1);
    assert_eq!(report.retailers.len(), 1);
    assert_eq!(report.retailers[0].id, "R3");
}

#[test]
fn date_window_filter_is_inclusive() {
    let filter = RecordFilter {
        date_range: Some((
            chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 11)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )),
        ..RecordFilter::default()
    };

    let report = run_pipeline(&fake_account_rows(), &filter, &PipelineConfig::default()).unwrap();

    // Both window-edge rows survive; the February revisit and R3 do not.
    assert_eq!(report.diagnostics.analyzed_rows, 2);
    assert_eq!(report.retailers.len(), 2);
}

#[test]
fn summary_rows_round_trip_through_json() {
    let report = run_pipeline(
        &fake_account_rows(),
        &RecordFilter::default(),
        &PipelineConfig::default(),
    )
    .unwrap();

    let rows = cluster_summary_rows(&report);
    let encoded = serde_json::to_string(&rows).unwrap();
    let decoded: Vec<ClusterSummaryRow> = serde_json::from_str(&encoded).unwrap();

    assert_eq!(
        rows, decoded,
        "Exported listing must re-import bit-for-bit, including counts and tiers"
    );
}

#[test]
fn long_fraction_scores_survive_json_exactly() {
    // Jaro-Winkler percentages routinely have no short decimal form;
    // the encode/decode cycle must preserve the exact f64 bits anyway.
    let row = ClusterSummaryRow {
        cluster_id: 0,
        member_count: 2,
        centroid_lat: 12.9716,
        centroid_lon: 77.5946,
        risk_score: 65.0,
        risk_tier: RiskTier::High,
        max_name_similarity: 91.04895104895105,
        trader_count: 1,
        phone_duplicate_pairs: 1,
    };

    let encoded = serde_json::to_string(&row).unwrap();
    let decoded: ClusterSummaryRow = serde_json::from_str(&encoded).unwrap();

    assert_eq!(
        row.max_name_similarity.to_bits(),
        decoded.max_name_similarity.to_bits(),
        "Re-imported similarity differs: {} vs {}",
        row.max_name_similarity,
        decoded.max_name_similarity
    );
    assert_eq!(row, decoded);
}

#[test]
fn member_and_similarity_rows_cover_the_selected_cluster() {
    let mut rows = fake_account_rows();
    // Image refs recorded on the latest R1 visit must surface in the
    // member listing.
    rows[2].selfie = Some(r#"["selfie-r1.jpg"]"#.into());
    rows[2].verification_doc = Some("doc-r1.pdf".into());

    let report = run_pipeline(&rows, &RecordFilter::default(), &PipelineConfig::default()).unwrap();
    let cluster_id = report.clusters[0].cluster.id;

    let members = member_rows(&report, cluster_id);
    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|m| m.retailer_id == "R2"));
    assert_eq!(members[0].traders, "T-1");

    let r1 = members.iter().find(|m| m.retailer_id == "R1").unwrap();
    assert_eq!(r1.selfie.as_deref(), Some("selfie-r1.jpg"));
    assert_eq!(r1.verification_doc.as_deref(), Some("doc-r1.pdf"));

    let pairs = similarity_rows(&report, cluster_id);
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].phone_match);
    // R1's canonical position is 1 m north, R2 is 4 m north: 3 m apart.
    assert!(
        (pairs[0].distance_m - 3.0).abs() < 0.5,
        "Pair distance should be ~3 m, got {:.2}",
        pairs[0].distance_m
    );

    // Unknown cluster ids yield empty listings, not panics.
    assert!(member_rows(&report, 999).is_empty());
    assert!(similarity_rows(&report, 999).is_empty());
}

#[test]
fn pipeline_is_deterministic_across_runs() {
    let rows = fake_account_rows();
    let config = PipelineConfig::default();
    let filter = RecordFilter::default();

    let a = run_pipeline(&rows, &filter, &config).unwrap();
    let b = run_pipeline(&rows, &filter, &config).unwrap();

    assert_eq!(cluster_summary_rows(&a), cluster_summary_rows(&b));
    assert_eq!(a.noise, b.noise);
}
