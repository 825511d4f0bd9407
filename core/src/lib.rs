//! storewatch-core: retailer identity-resolution and fraud-risk pipeline.
//!
//! Field traders record retailer visits with GPS coordinates. Fraudulent
//! traders register multiple fake retailer accounts at one physical spot
//! to collect incentive payouts. This crate collapses visit records into
//! unique retailer identities, clusters them by GPS proximity, scores
//! within-cluster name/phone similarity, and assigns each cluster a
//! 0-100 fraud-risk score and tier.
//!
//! Modules, in pipeline order:
//!   - `record`: raw-row schema contract and row validation
//!   - `filter`: thin pre-normalization query filter
//!   - `normalize`: fold visits into unique retailers
//!   - `geo`: haversine distance and centroids
//!   - `cluster`: radius-based proximity clustering
//!   - `similarity`: fuzzy name and phone-duplicate signals
//!   - `risk`: cluster fraud-risk scoring
//!   - `report`: flat rows for export
//!   - `pipeline`: end-to-end orchestration
//!   - `config`, `error`, `types`: parameters, error taxonomy, primitives

pub mod cluster;
pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod risk;
pub mod similarity;
pub mod types;
