//! The ledger service: item mutations, each atomic with its audit entry.
//!
//! Orchestrates an [`ItemStore`](medledger_store::ItemStore) (authoritative
//! state) and an [`AuditLog`](medledger_store::AuditLog) (history). Store
//! errors propagate verbatim; audit-append failures are logged and
//! swallowed — the preceding item mutation has already happened and is not
//! undone.

pub mod service;

mod integration_tests;

pub use service::Ledger;
