//! Raw visit-record schema and row validation.
//!
//! Field tooling exports loosely-typed tables: numbers arrive as strings,
//! dates in several formats, and whole columns go missing when an export
//! is misconfigured. `RawVisitRecord` is the explicit schema contract for
//! that input; `validate_records` turns it into strongly-typed
//! `VisitRecord`s, dropping bad rows with a per-reason tally instead of
//! aborting the run. Only a required field missing from *every* row is
//! treated as a dataset-level failure (the column is absent).

use crate::error::{PipelineError, PipelineResult};
use crate::geo::GeoPoint;
use crate::types::{InputRank, RetailerId, TraderId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the uploaded dataset, before validation. Every field is
/// optional so a single malformed row can be dropped and counted rather
/// than failing deserialization of the whole table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawVisitRecord {
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default)]
    pub darkstore: Option<String>,
    #[serde(default)]
    pub trader_id: Option<String>,
    #[serde(default)]
    pub trader_name: Option<String>,
    #[serde(default)]
    pub retailer_id: Option<String>,
    #[serde(default)]
    pub retailer_name: Option<String>,
    #[serde(default)]
    pub retailer_phone: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub longitude: Option<f64>,
    /// Opaque image references, carried through for display only.
    #[serde(default)]
    pub selfie: Option<String>,
    #[serde(default)]
    pub verification_doc: Option<String>,
}

/// One validated, immutable field-visit event.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    /// Position of the source row in the original input.
    pub rank: InputRank,
    pub visit_date: NaiveDateTime,
    pub darkstore: String,
    pub trader_id: TraderId,
    pub trader_name: String,
    pub retailer_id: RetailerId,
    pub retailer_name: String,
    pub retailer_phone: String,
    pub position: GeoPoint,
    pub selfie: Option<String>,
    pub verification_doc: Option<String>,
}

/// Why a row was dropped. The labels double as tally keys in diagnostics.
const REASON_BAD_DATE: &str = "unparseable visit_date";
const REASON_BAD_COORDINATE: &str = "invalid coordinate";

const REQUIRED_FIELDS: &[&str] = &[
    "visit_date",
    "darkstore",
    "trader_id",
    "trader_name",
    "retailer_id",
    "retailer_name",
    "retailer_phone",
    "latitude",
    "longitude",
];

/// Outcome of row validation: the surviving records plus a diagnostic
/// count of what was dropped and why.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub records: Vec<VisitRecord>,
    pub dropped: usize,
    /// Drop reason -> number of rows dropped for that reason.
    pub drop_reasons: BTreeMap<String, usize>,
}

/// Validate every raw row. Invalid rows are dropped and tallied; the run
/// only fails when the input is non-empty and some required field is
/// missing from every single row, which means the column itself is
/// absent from the export.
pub fn validate_records(raw: &[RawVisitRecord]) -> PipelineResult<ValidationOutcome> {
    let mut outcome = ValidationOutcome::default();
    let mut missing_counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    for (rank, row) in raw.iter().enumerate() {
        match validate_row(rank, row) {
            Ok(record) => outcome.records.push(record),
            Err(reason) => {
                outcome.dropped += 1;
                if let RowError::MissingField(field) = reason {
                    *missing_counts.entry(field).or_insert(0) += 1;
                }
                *outcome.drop_reasons.entry(reason.label()).or_insert(0) += 1;
            }
        }
    }

    if !raw.is_empty() {
        for field in REQUIRED_FIELDS {
            if missing_counts.get(field).copied().unwrap_or(0) == raw.len() {
                return Err(PipelineError::Validation(format!(
                    "required column '{field}' is missing from all {} rows",
                    raw.len()
                )));
            }
        }
    }

    if outcome.dropped > 0 {
        log::warn!(
            "Dropped {} of {} rows during validation: {:?}",
            outcome.dropped,
            raw.len(),
            outcome.drop_reasons
        );
    }

    Ok(outcome)
}

enum RowError {
    MissingField(&'static str),
    BadDate,
    BadCoordinate,
}

impl RowError {
    fn label(&self) -> String {
        match self {
            RowError::MissingField(field) => format!("missing {field}"),
            RowError::BadDate => REASON_BAD_DATE.to_string(),
            RowError::BadCoordinate => REASON_BAD_COORDINATE.to_string(),
        }
    }
}

fn validate_row(rank: InputRank, row: &RawVisitRecord) -> Result<VisitRecord, RowError> {
    let date_raw = required_str(&row.visit_date, "visit_date")?;
    let darkstore = required_str(&row.darkstore, "darkstore")?;
    let trader_id = required_str(&row.trader_id, "trader_id")?;
    let trader_name = required_str(&row.trader_name, "trader_name")?;
    let retailer_id = required_str(&row.retailer_id, "retailer_id")?;
    let retailer_name = required_str(&row.retailer_name, "retailer_name")?;
    let retailer_phone = required_str(&row.retailer_phone, "retailer_phone")?;
    let lat = row.latitude.ok_or(RowError::MissingField("latitude"))?;
    let lon = row.longitude.ok_or(RowError::MissingField("longitude"))?;

    let visit_date = parse_visit_date(&date_raw).ok_or(RowError::BadDate)?;

    if !GeoPoint::is_valid(lat, lon) {
        return Err(RowError::BadCoordinate);
    }

    Ok(VisitRecord {
        rank,
        visit_date,
        darkstore,
        trader_id,
        trader_name,
        retailer_id,
        retailer_name,
        retailer_phone,
        position: GeoPoint { lat, lon },
        selfie: clean_image_ref(&row.selfie),
        verification_doc: clean_image_ref(&row.verification_doc),
    })
}

fn required_str(value: &Option<String>, field: &'static str) -> Result<String, RowError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(RowError::MissingField(field)),
    }
}

/// Accept the timestamp formats seen across field-tool exports.
pub fn parse_visit_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Image references sometimes arrive wrapped in list syntax ("[...]") or
/// quotes; strip that noise but otherwise pass the value through opaque.
fn clean_image_ref(value: &Option<String>) -> Option<String> {
    let raw = value.as_deref()?.trim();
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '"' | '\''))
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Deserialize an optional f64 that may arrive as a JSON number or as a
/// numeric string, mirroring the loosely-typed tables the field tooling
/// produces. Unparseable strings become `None` and fall out as missing
/// fields during row validation.
fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Text(String),
    }

    match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Num(n)) => Ok(Some(n)),
        Some(NumOrString::Text(s)) => Ok(s.trim().parse::<f64>().ok()),
        None => Ok(None),
    }
}
