//! Record normalizer: collapse visit records into unique retailer
//! identities.
//!
//! Every distinct retailer id in the valid input produces exactly one
//! `Retailer`, folded from all of its visits: visit count, the union of
//! trader ids and darkstore labels, and a canonical name/phone/coordinate
//! chosen by the configured `CanonicalPolicy`. The fold is deterministic;
//! the canonical values feed name and phone matching downstream, so any
//! tie-break ambiguity here would show up as unstable risk scores.

use crate::config::CanonicalPolicy;
use crate::geo::GeoPoint;
use crate::record::VisitRecord;
use crate::types::{InputRank, RetailerId, TraderId};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// One unique retailer identity, folded from all visits sharing its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Retailer {
    pub id: RetailerId,
    pub name: String,
    pub phone: String,
    pub position: GeoPoint,
    pub visit_count: usize,
    pub traders: BTreeSet<TraderId>,
    pub darkstores: BTreeSet<String>,
    /// Rank of this retailer's first appearance in the input. Drives all
    /// stable ordering downstream (cluster ids, member order).
    pub first_seen: InputRank,
    pub last_visit: NaiveDateTime,
    /// Opaque image references from the latest visit, for display.
    pub selfie: Option<String>,
    pub verification_doc: Option<String>,
}

/// Fold validated records into unique retailers, returned in first-seen
/// input order.
pub fn normalize(records: &[VisitRecord], policy: CanonicalPolicy) -> Vec<Retailer> {
    let mut order: Vec<RetailerId> = Vec::new();
    let mut groups: HashMap<RetailerId, Vec<&VisitRecord>> = HashMap::new();

    for record in records {
        let group = groups.entry(record.retailer_id.clone()).or_default();
        if group.is_empty() {
            order.push(record.retailer_id.clone());
        }
        group.push(record);
    }

    let retailers: Vec<Retailer> = order
        .into_iter()
        .filter_map(|id| {
            let group = &groups[&id];
            fold_group(id, group, policy)
        })
        .collect();

    log::info!(
        "Normalized {} visit records into {} unique retailers",
        records.len(),
        retailers.len()
    );
    retailers
}

/// Returns `None` only for an empty group, which `normalize` never
/// builds.
fn fold_group(
    id: RetailerId,
    visits: &[&VisitRecord],
    policy: CanonicalPolicy,
) -> Option<Retailer> {
    let latest = visits.iter().max_by_key(|v| (v.visit_date, v.rank))?;

    let (name, phone, position) = match policy {
        CanonicalPolicy::LatestVisit => (
            latest.retailer_name.clone(),
            latest.retailer_phone.clone(),
            latest.position,
        ),
        CanonicalPolicy::MostFrequent => (
            most_frequent(visits, |v| v.retailer_name.clone(), |v| {
                v.retailer_name.clone()
            })?,
            most_frequent(visits, |v| v.retailer_phone.clone(), |v| {
                v.retailer_phone.clone()
            })?,
            most_frequent(
                visits,
                |v| (v.position.lat.to_bits(), v.position.lon.to_bits()),
                |v| v.position,
            )?,
        ),
    };

    Some(Retailer {
        id,
        name,
        phone,
        position,
        visit_count: visits.len(),
        traders: visits.iter().map(|v| v.trader_id.clone()).collect(),
        darkstores: visits.iter().map(|v| v.darkstore.clone()).collect(),
        first_seen: visits.iter().map(|v| v.rank).min()?,
        last_visit: latest.visit_date,
        selfie: latest.selfie.clone(),
        verification_doc: latest.verification_doc.clone(),
    })
}

/// Modal value of `value(visit)` across a group, keyed by `key(visit)`.
/// Frequency ties go to the value whose latest occurrence is
/// chronologically later (then later input rank).
fn most_frequent<K, V>(
    visits: &[&VisitRecord],
    key: impl Fn(&VisitRecord) -> K,
    value: impl Fn(&VisitRecord) -> V,
) -> Option<V>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    let mut tallies: HashMap<K, (usize, (NaiveDateTime, InputRank), V)> = HashMap::new();
    for visit in visits {
        let entry = tallies
            .entry(key(visit))
            .or_insert_with(|| (0, (visit.visit_date, visit.rank), value(visit)));
        entry.0 += 1;
        let seen = (visit.visit_date, visit.rank);
        if seen > entry.1 {
            entry.1 = seen;
        }
    }
    tallies
        .into_values()
        .max_by_key(|(count, latest, _)| (*count, *latest))
        .map(|(_, _, v)| v)
}
