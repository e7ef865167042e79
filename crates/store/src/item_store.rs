use std::sync::Arc;

use async_trait::async_trait;

use medledger_core::{ItemId, LedgerResult, Owner};
use medledger_inventory::{Item, ItemDraft, ItemPatch};

/// Result of an `update`: whether the write actually changed anything.
///
/// Deliberately distinct from `NotFound`: an empty or no-op patch against a
/// live item is a successful write that only refreshed `updated_at`, never
/// an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Changed,
    Unchanged,
}

/// Authoritative store of inventory items.
///
/// ## Implementation requirements
///
/// - `create` and renaming `update`s enforce case-insensitive name
///   uniqueness per owner (`name_key`); a collision fails the operation and
///   leaves the existing item untouched.
/// - `adjust_quantity` is an atomic conditional update: concurrent callers
///   on the same item serialize, and a negative delta that would drive the
///   quantity below zero fails with `InsufficientStock` leaving the
///   quantity unchanged. A naive read-modify-write loses updates and must
///   not be used.
/// - No cross-item coordination: operations on distinct items proceed in
///   parallel.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a validated draft. Assigns id and timestamps, derives
    /// `name_key`. Fails with `DuplicateName` on a per-owner collision.
    async fn create(&self, draft: ItemDraft) -> LedgerResult<Item>;

    async fn get(&self, id: ItemId) -> LedgerResult<Item>;

    /// All items visible to an owner. Unordered; the caller renders.
    async fn list_by_owner(&self, owner: &Owner) -> LedgerResult<Vec<Item>>;

    /// Apply a partial update. Always refreshes `updated_at`, even when the
    /// patch changes nothing.
    async fn update(&self, id: ItemId, patch: ItemPatch) -> LedgerResult<(Item, UpdateOutcome)>;

    /// Remove an item, returning its final state (the ledger needs the
    /// pre-deletion name for the audit entry).
    async fn delete(&self, id: ItemId) -> LedgerResult<Item>;

    /// Atomically apply `quantity += delta` (negative for a sale, positive
    /// for a restock), enforcing the non-negative floor.
    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> LedgerResult<Item>;

    /// Exact (case-sensitive) current-name lookup; analytics re-resolves
    /// historical sales by name through this.
    async fn find_by_name(&self, name: &str) -> LedgerResult<Option<Item>>;
}

#[async_trait]
impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    async fn create(&self, draft: ItemDraft) -> LedgerResult<Item> {
        (**self).create(draft).await
    }

    async fn get(&self, id: ItemId) -> LedgerResult<Item> {
        (**self).get(id).await
    }

    async fn list_by_owner(&self, owner: &Owner) -> LedgerResult<Vec<Item>> {
        (**self).list_by_owner(owner).await
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> LedgerResult<(Item, UpdateOutcome)> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: ItemId) -> LedgerResult<Item> {
        (**self).delete(id).await
    }

    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> LedgerResult<Item> {
        (**self).adjust_quantity(id, delta).await
    }

    async fn find_by_name(&self, name: &str) -> LedgerResult<Option<Item>> {
        (**self).find_by_name(name).await
    }
}
