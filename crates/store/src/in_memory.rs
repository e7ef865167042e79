//! In-memory store implementations.
//!
//! Intended for tests/dev. `adjust_quantity` serializes concurrent callers
//! through the exclusive write lock, giving the same lost-update safety the
//! Postgres implementation gets from its conditional single-statement
//! update.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use medledger_audit::{AuditAction, AuditEntry, NewAuditEntry};
use medledger_core::{EntryId, ItemId, LedgerError, LedgerResult, Owner};
use medledger_inventory::{Item, ItemDraft, ItemPatch};

use crate::audit_log::AuditLog;
use crate::item_store::{ItemStore, UpdateOutcome};

/// In-memory item store.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> LedgerError {
    LedgerError::storage("lock poisoned")
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn create(&self, draft: ItemDraft) -> LedgerResult<Item> {
        let mut items = self.items.write().map_err(|_| poisoned())?;

        let key = draft.name_key();
        if items
            .values()
            .any(|i| i.owner == draft.owner && i.name_key == key)
        {
            return Err(LedgerError::duplicate_name(&draft.name));
        }

        let item = Item::from_draft(ItemId::new(), draft, Utc::now());
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: ItemId) -> LedgerResult<Item> {
        let items = self.items.read().map_err(|_| poisoned())?;
        items.get(&id).cloned().ok_or(LedgerError::NotFound)
    }

    async fn list_by_owner(&self, owner: &Owner) -> LedgerResult<Vec<Item>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items
            .values()
            .filter(|i| &i.owner == owner)
            .cloned()
            .collect())
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> LedgerResult<(Item, UpdateOutcome)> {
        let mut items = self.items.write().map_err(|_| poisoned())?;

        // Rename collision check against the target's owner, excluding self.
        if let Some(name) = &patch.name {
            let owner = items
                .get(&id)
                .map(|i| i.owner.clone())
                .ok_or(LedgerError::NotFound)?;
            let key = medledger_core::NameKey::of(name);
            if items
                .values()
                .any(|i| i.id != id && i.owner == owner && i.name_key == key)
            {
                return Err(LedgerError::duplicate_name(name));
            }
        }

        let Some(item) = items.get_mut(&id) else {
            return Err(LedgerError::NotFound);
        };

        let changed = patch.apply_to(item);
        item.updated_at = Utc::now();

        let outcome = if changed {
            UpdateOutcome::Changed
        } else {
            UpdateOutcome::Unchanged
        };
        Ok((item.clone(), outcome))
    }

    async fn delete(&self, id: ItemId) -> LedgerResult<Item> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.remove(&id).ok_or(LedgerError::NotFound)
    }

    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> LedgerResult<Item> {
        let mut items = self.items.write().map_err(|_| poisoned())?;

        let Some(item) = items.get_mut(&id) else {
            return Err(LedgerError::NotFound);
        };

        // checked: a quantity near i64::MAX is valid input, and the
        // adjustment must not wrap.
        let Some(new_quantity) = item.quantity.checked_add(delta) else {
            return if delta < 0 {
                Err(LedgerError::insufficient_stock(
                    item.quantity,
                    delta.saturating_neg(),
                ))
            } else {
                Err(LedgerError::validation(
                    "restock would overflow the stock quantity",
                ))
            };
        };
        if new_quantity < 0 {
            return Err(LedgerError::insufficient_stock(item.quantity, -delta));
        }

        item.quantity = new_quantity;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn find_by_name(&self, name: &str) -> LedgerResult<Option<Item>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.values().find(|i| i.name == name).cloned())
    }
}

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries ever appended (test support).
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: NewAuditEntry) -> LedgerResult<AuditEntry> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let stored = AuditEntry {
            id: EntryId::new(),
            item_id: entry.item_id,
            action: entry.action,
            details: entry.details,
            fact: entry.fact,
            timestamp: entry.timestamp,
        };
        entries.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, limit: usize) -> LedgerResult<Vec<AuditEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_action(&self, action: AuditAction) -> LedgerResult<Vec<AuditEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect())
    }
}
