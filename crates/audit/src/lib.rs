//! Audit trail records: immutable, append-only history of item mutations.
//!
//! Each entry carries a human-readable `details` string for display and,
//! for stock movements, a structured [`MovementFact`] captured at mutation
//! time. Analytics prefers the fact; the `details` grammar in [`details`]
//! exists only as a fallback for legacy entries.

pub mod details;
pub mod entry;

pub use entry::{AuditAction, AuditEntry, MovementFact, NewAuditEntry};
