//! storewatch-runner: headless pipeline runner.
//!
//! Usage:
//!   storewatch-runner --input visits.json
//!   storewatch-runner --input visits.json --radius 15 --min-members 3 --json
//!   storewatch-runner --input visits.json --darkstore "DS-Koramangala" --trader T-104

use anyhow::{Context, Result};
use chrono::NaiveDate;
use storewatch_core::{
    config::PipelineConfig,
    filter::RecordFilter,
    pipeline::{run_pipeline, PipelineReport},
    record::RawVisitRecord,
    report::{cluster_summary_rows, member_rows, similarity_rows},
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = flag_value(&args, "--input") else {
        eprintln!(
            "Usage: storewatch-runner --input visits.json \
             [--radius M] [--min-members N] [--threshold P] \
             [--darkstore NAME] [--trader ID] [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--json]"
        );
        std::process::exit(2);
    };

    let mut config = PipelineConfig::default();
    config.radius_meters = parse_arg(&args, "--radius", config.radius_meters);
    config.min_members = parse_arg(&args, "--min-members", config.min_members);
    config.name_similarity_threshold =
        parse_arg(&args, "--threshold", config.name_similarity_threshold);

    let filter = build_filter(&args)?;
    let json_output = args.iter().any(|a| a == "--json");

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Cannot read input file {input}"))?;
    let raw: Vec<RawVisitRecord> =
        serde_json::from_str(&content).context("Input must be a JSON array of visit records")?;

    log::info!("Loaded {} raw rows from {input}", raw.len());
    let report = run_pipeline(&raw, &filter, &config)?;

    if json_output {
        print_json(&report)?;
    } else {
        print_summary(&report, &config);
    }
    Ok(())
}

fn build_filter(args: &[String]) -> Result<RecordFilter> {
    let mut filter = RecordFilter::default();
    if let Some(store) = flag_value(args, "--darkstore") {
        filter.darkstores = Some(vec![store]);
    }
    if let Some(trader) = flag_value(args, "--trader") {
        filter.traders = Some(vec![trader]);
    }
    let from = flag_value(args, "--from")
        .map(|d| parse_day(&d, false))
        .transpose()?;
    let to = flag_value(args, "--to")
        .map(|d| parse_day(&d, true))
        .transpose()?;
    filter.date_range = match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        (Some(from), None) => Some((from, chrono::NaiveDateTime::MAX)),
        (None, Some(to)) => Some((chrono::NaiveDateTime::MIN, to)),
        (None, None) => None,
    };
    Ok(filter)
}

fn parse_day(raw: &str, end_of_day: bool) -> Result<chrono::NaiveDateTime> {
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}', expected YYYY-MM-DD"))?;
    let dt = if end_of_day {
        day.and_hms_opt(23, 59, 59)
    } else {
        day.and_hms_opt(0, 0, 0)
    };
    dt.with_context(|| format!("Invalid time of day for '{raw}'"))
}

fn print_summary(report: &PipelineReport, config: &PipelineConfig) {
    let d = &report.diagnostics;
    println!("=== RUN SUMMARY ===");
    println!("  input rows:       {}", d.input_rows);
    println!("  valid rows:       {}", d.valid_rows);
    println!("  dropped rows:     {}", d.dropped_rows);
    for (reason, count) in &d.drop_reasons {
        println!("    {reason}: {count}");
    }
    println!("  analyzed rows:    {}", d.analyzed_rows);
    println!("  unique retailers: {}", report.retailers.len());
    println!("  clusters:         {}", report.clusters.len());
    println!("  noise retailers:  {}", report.noise.len());
    println!(
        "  parameters:       radius {} m, min members {}, similarity threshold {}%",
        config.radius_meters, config.min_members, config.name_similarity_threshold
    );

    if report.clusters.is_empty() {
        println!();
        println!("No proximity clusters found.");
        return;
    }

    println!();
    println!("=== CLUSTERS ===");
    for row in cluster_summary_rows(report) {
        println!(
            "  #{:<3} | members: {:<3} | score: {:>5.1} | tier: {:<6} | max name sim: {:>5.1}% | traders: {} | phone dups: {}",
            row.cluster_id,
            row.member_count,
            row.risk_score,
            row.risk_tier.to_string(),
            row.max_name_similarity,
            row.trader_count,
            row.phone_duplicate_pairs,
        );
    }
}

fn print_json(report: &PipelineReport) -> Result<()> {
    let summaries = cluster_summary_rows(report);
    let members: Vec<_> = summaries
        .iter()
        .flat_map(|s| member_rows(report, s.cluster_id))
        .collect();
    let pairs: Vec<_> = summaries
        .iter()
        .flat_map(|s| similarity_rows(report, s.cluster_id))
        .collect();

    let out = serde_json::json!({
        "diagnostics": {
            "input_rows": report.diagnostics.input_rows,
            "valid_rows": report.diagnostics.valid_rows,
            "dropped_rows": report.diagnostics.dropped_rows,
            "drop_reasons": report.diagnostics.drop_reasons,
            "analyzed_rows": report.diagnostics.analyzed_rows,
        },
        "clusters": summaries,
        "members": members,
        "similarity": pairs,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
