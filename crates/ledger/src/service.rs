use chrono::Utc;

use medledger_audit::{AuditEntry, MovementFact, NewAuditEntry};
use medledger_core::{ItemId, LedgerError, LedgerResult, Owner};
use medledger_inventory::{Item, ItemDraft, ItemPatch};
use medledger_store::{AuditLog, ItemStore, UpdateOutcome};

/// The inventory ledger.
///
/// Holds explicit store handles constructed once at process start — no
/// ambient globals. Generic over the store implementations; `Arc`-wrapped
/// stores satisfy the bounds through the blanket impls, so one ledger can
/// be shared across concurrent callers.
///
/// Every successful mutation appends exactly one audit entry. The append is
/// **best-effort**: a failure is logged and never surfaced, because the
/// item mutation is authoritative and already durable by then.
#[derive(Debug)]
pub struct Ledger<S, A> {
    items: S,
    audit: A,
}

impl<S, A> Ledger<S, A>
where
    S: ItemStore,
    A: AuditLog,
{
    pub fn new(items: S, audit: A) -> Self {
        Self { items, audit }
    }

    /// Create an item. Fails with `DuplicateName` if the owner already has
    /// a live item whose name differs only by case.
    pub async fn create_item(&self, draft: ItemDraft) -> LedgerResult<Item> {
        draft.validate()?;
        let item = self.items.create(draft).await?;
        self.record(NewAuditEntry::created(item.id, &item.name, Utc::now()))
            .await;
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> LedgerResult<Item> {
        self.items.get(id).await
    }

    pub async fn list_items(&self, owner: &Owner) -> LedgerResult<Vec<Item>> {
        self.items.list_by_owner(owner).await
    }

    /// Apply a partial update. The audit entry carries the **post-update**
    /// name. `Unchanged` is still a success and still audited.
    pub async fn update_item(
        &self,
        id: ItemId,
        patch: ItemPatch,
    ) -> LedgerResult<(Item, UpdateOutcome)> {
        patch.validate()?;
        let (item, outcome) = self.items.update(id, patch).await?;
        self.record(NewAuditEntry::updated(item.id, &item.name, Utc::now()))
            .await;
        Ok((item, outcome))
    }

    /// Delete an item. The audit entry carries the **pre-deletion** name;
    /// earlier entries for the item are kept (weak reference, no cascade).
    pub async fn delete_item(&self, id: ItemId) -> LedgerResult<Item> {
        let item = self.items.delete(id).await?;
        self.record(NewAuditEntry::deleted(item.id, &item.name, Utc::now()))
            .await;
        Ok(item)
    }

    /// Sell `quantity` units. On `InsufficientStock` nothing is written,
    /// audit included.
    pub async fn sell_item(&self, id: ItemId, quantity: i64) -> LedgerResult<Item> {
        if quantity <= 0 {
            return Err(LedgerError::validation(
                "sale quantity must be a positive integer",
            ));
        }
        let item = self.items.adjust_quantity(id, -quantity).await?;
        self.record(NewAuditEntry::sold(
            item.id,
            movement(&item, quantity),
            Utc::now(),
        ))
        .await;
        Ok(item)
    }

    /// Restock `quantity` units.
    pub async fn restock_item(&self, id: ItemId, quantity: i64) -> LedgerResult<Item> {
        if quantity <= 0 {
            return Err(LedgerError::validation(
                "restock quantity must be a positive integer",
            ));
        }
        let item = self.items.adjust_quantity(id, quantity).await?;
        self.record(NewAuditEntry::restocked(
            item.id,
            movement(&item, quantity),
            Utc::now(),
        ))
        .await;
        Ok(item)
    }

    /// Items of this owner at or below their reorder level.
    pub async fn low_stock(&self, owner: &Owner) -> LedgerResult<Vec<Item>> {
        let items = self.items.list_by_owner(owner).await?;
        Ok(items.into_iter().filter(Item::is_low_stock).collect())
    }

    /// The most recent audit entries, newest first.
    pub async fn recent_activity(&self, limit: usize) -> LedgerResult<Vec<AuditEntry>> {
        self.audit.recent(limit).await
    }

    /// Best-effort audit append: the mutation already succeeded, so a
    /// failure here is logged and dropped rather than surfaced.
    async fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.audit.append(entry).await {
            tracing::warn!(
                code = e.code(),
                error = %e,
                "audit append failed; item mutation already committed"
            );
        }
    }
}

fn movement(item: &Item, quantity: i64) -> MovementFact {
    MovementFact {
        item_name: item.name.clone(),
        quantity,
        unit: item.unit.clone(),
        unit_price: item.price,
    }
}
