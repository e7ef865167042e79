//! Derived, read-only views over the audit trail and item store.
//!
//! All sale-derived numbers come from `sold` audit entries joined back to
//! the item store **by current name** — historical entries may reference
//! renamed or deleted items, and the join intentionally prices sales at the
//! item's current price. Unresolvable or unparseable entries degrade softly
//! (contribute zero or are skipped); analytics never fails because one old
//! entry is malformed.

pub mod engine;

pub use engine::{Analytics, SalesMode, SalesPoint, StockSummary, TopSellingItem};
