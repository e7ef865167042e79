use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medledger_core::{ItemId, LedgerError, LedgerResult, NameKey, Owner};

/// A stock item.
///
/// `name_key` is derived from `name` and never set directly; it is the
/// uniqueness key within an owner's live items. `quantity` never goes
/// negative — the store layer enforces the floor on every adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner: Owner,
    pub name: String,
    pub name_key: NameKey,
    pub description: String,
    /// Free text, e.g. "tablets".
    pub unit: String,
    pub quantity: i64,
    /// Days until expiry, counted from `created_at`.
    pub use_period_days: i64,
    /// Unit sale price.
    pub price: Decimal,
    /// `quantity <= reorder_level` means the item is low on stock.
    pub reorder_level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Materialize an item from a validated draft.
    pub fn from_draft(id: ItemId, draft: ItemDraft, now: DateTime<Utc>) -> Self {
        let name_key = NameKey::of(&draft.name);
        Self {
            id,
            owner: draft.owner,
            name: draft.name,
            name_key,
            description: draft.description,
            unit: draft.unit,
            quantity: draft.quantity,
            use_period_days: draft.use_period_days,
            price: draft.price,
            reorder_level: draft.reorder_level,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    /// Expiry instant: `created_at` plus the use period.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(self.use_period_days)
    }
}

/// Payload for creating an item. Validate before handing to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub owner: Owner,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub quantity: i64,
    pub use_period_days: i64,
    pub price: Decimal,
    pub reorder_level: i64,
}

impl ItemDraft {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::validation("name cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(LedgerError::validation("unit cannot be empty"));
        }
        if self.quantity < 0 {
            return Err(LedgerError::validation("quantity cannot be negative"));
        }
        if self.use_period_days < 0 {
            return Err(LedgerError::validation("use period cannot be negative"));
        }
        if self.price < Decimal::ZERO {
            return Err(LedgerError::validation("price cannot be negative"));
        }
        if self.reorder_level < 0 {
            return Err(LedgerError::validation("reorder level cannot be negative"));
        }
        Ok(())
    }

    /// Uniqueness key the created item will carry.
    pub fn name_key(&self) -> NameKey {
        NameKey::of(&self.name)
    }
}

/// Partial update: only supplied fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<i64>,
    pub use_period_days: Option<i64>,
    pub price: Option<Decimal>,
    pub reorder_level: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(LedgerError::validation("name cannot be empty"));
            }
        }
        if let Some(unit) = &self.unit {
            if unit.trim().is_empty() {
                return Err(LedgerError::validation("unit cannot be empty"));
            }
        }
        if matches!(self.quantity, Some(q) if q < 0) {
            return Err(LedgerError::validation("quantity cannot be negative"));
        }
        if matches!(self.use_period_days, Some(d) if d < 0) {
            return Err(LedgerError::validation("use period cannot be negative"));
        }
        if matches!(self.price, Some(p) if p < Decimal::ZERO) {
            return Err(LedgerError::validation("price cannot be negative"));
        }
        if matches!(self.reorder_level, Some(r) if r < 0) {
            return Err(LedgerError::validation("reorder level cannot be negative"));
        }
        Ok(())
    }

    /// Apply supplied fields in place; returns whether anything changed.
    ///
    /// A rename recomputes `name_key`. `updated_at` is the store's concern
    /// (it is refreshed even when nothing changed).
    pub fn apply_to(&self, item: &mut Item) -> bool {
        let mut changed = false;

        if let Some(name) = &self.name {
            if name != &item.name {
                item.name = name.clone();
                item.name_key = NameKey::of(name);
                changed = true;
            }
        }
        if let Some(description) = &self.description {
            if description != &item.description {
                item.description = description.clone();
                changed = true;
            }
        }
        if let Some(unit) = &self.unit {
            if unit != &item.unit {
                item.unit = unit.clone();
                changed = true;
            }
        }
        if let Some(quantity) = self.quantity {
            if quantity != item.quantity {
                item.quantity = quantity;
                changed = true;
            }
        }
        if let Some(days) = self.use_period_days {
            if days != item.use_period_days {
                item.use_period_days = days;
                changed = true;
            }
        }
        if let Some(price) = self.price {
            if price != item.price {
                item.price = price;
                changed = true;
            }
        }
        if let Some(level) = self.reorder_level {
            if level != item.reorder_level {
                item.reorder_level = level;
                changed = true;
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draft() -> ItemDraft {
        ItemDraft {
            owner: Owner::from("pharmacist@example.com"),
            name: "Aspirin".to_string(),
            description: "Pain relief".to_string(),
            unit: "tablets".to_string(),
            quantity: 100,
            use_period_days: 365,
            price: Decimal::new(20, 1), // 2.0
            reorder_level: 10,
        }
    }

    fn test_item() -> Item {
        Item::from_draft(ItemId::new(), test_draft(), Utc::now())
    }

    #[test]
    fn draft_materializes_with_derived_name_key() {
        let item = test_item();
        assert_eq!(item.name_key, NameKey::of("aspirin"));
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut draft = test_draft();
        draft.name = "   ".to_string();
        let err = draft.validate().unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut draft = test_draft();
        draft.price = Decimal::new(-1, 0);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn low_stock_boundary_is_inclusive() {
        let mut item = test_item();
        item.quantity = item.reorder_level;
        assert!(item.is_low_stock());
        item.quantity = item.reorder_level + 1;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn expiry_counts_from_creation() {
        let item = test_item();
        assert_eq!(item.expires_at(), item.created_at + Duration::days(365));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut item = test_item();
        let before = item.clone();
        let changed = ItemPatch::default().apply_to(&mut item);
        assert!(!changed);
        assert_eq!(item, before);
    }

    #[test]
    fn rename_recomputes_name_key() {
        let mut item = test_item();
        let patch = ItemPatch {
            name: Some("Ibuprofen".to_string()),
            ..Default::default()
        };
        assert!(patch.apply_to(&mut item));
        assert_eq!(item.name, "Ibuprofen");
        assert_eq!(item.name_key, NameKey::of("ibuprofen"));
    }

    #[test]
    fn patch_with_identical_values_reports_unchanged() {
        let mut item = test_item();
        let patch = ItemPatch {
            name: Some(item.name.clone()),
            quantity: Some(item.quantity),
            ..Default::default()
        };
        assert!(!patch.apply_to(&mut item));
    }

    #[test]
    fn patch_validation_covers_supplied_fields_only() {
        let patch = ItemPatch {
            unit: Some("".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(ItemPatch::default().validate().is_ok());
    }
}
