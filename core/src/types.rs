//! Shared primitive types used across the entire pipeline.

/// A stable identifier for a retailer account, as recorded in the field.
pub type RetailerId = String;

/// A stable identifier for the field trader who performed a visit.
pub type TraderId = String;

/// A sequential cluster identifier, assigned in stable first-seen order.
pub type ClusterId = u32;

/// Zero-based rank of a record in the original input, used wherever a
/// deterministic tie-break or stable ordering is required.
pub type InputRank = usize;
