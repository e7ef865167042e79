use std::sync::Arc;

use async_trait::async_trait;

use medledger_audit::{AuditAction, AuditEntry, NewAuditEntry};
use medledger_core::LedgerResult;

/// Append-only, time-ordered record of actions taken against items.
///
/// Entries are never mutated or deleted; they outlive the items they
/// describe (no cascade on item deletion). Appends need no locking beyond
/// the storage layer's native insert atomicity.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one entry, assigning its id. A storage failure surfaces as
    /// `Storage`; the ledger treats it as advisory for the triggering
    /// mutation.
    async fn append(&self, entry: NewAuditEntry) -> LedgerResult<AuditEntry>;

    /// The most recent entries, newest first.
    async fn recent(&self, limit: usize) -> LedgerResult<Vec<AuditEntry>>;

    /// All entries for one action, in insertion order.
    async fn find_by_action(&self, action: AuditAction) -> LedgerResult<Vec<AuditEntry>>;
}

#[async_trait]
impl<A> AuditLog for Arc<A>
where
    A: AuditLog + ?Sized,
{
    async fn append(&self, entry: NewAuditEntry) -> LedgerResult<AuditEntry> {
        (**self).append(entry).await
    }

    async fn recent(&self, limit: usize) -> LedgerResult<Vec<AuditEntry>> {
        (**self).recent(limit).await
    }

    async fn find_by_action(&self, action: AuditAction) -> LedgerResult<Vec<AuditEntry>> {
        (**self).find_by_action(action).await
    }
}
