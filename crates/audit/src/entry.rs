use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medledger_core::{EntryId, ItemId, LedgerError};

use crate::details;

/// Action recorded by an audit entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Sold,
    Restocked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Sold => "sold",
            Self::Restocked => "restocked",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AuditAction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            "sold" => Ok(Self::Sold),
            "restocked" => Ok(Self::Restocked),
            other => Err(LedgerError::validation(format!(
                "unknown audit action '{other}'"
            ))),
        }
    }
}

/// Structured record of a stock movement, captured at mutation time.
///
/// `item_name` and `unit_price` are snapshots of the item as it was when the
/// movement happened; the item may be renamed or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementFact {
    pub item_name: String,
    pub quantity: i64,
    pub unit: String,
    pub unit_price: Decimal,
}

/// An audit entry ready to be appended (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Weak reference: the entry outlives deletion of its item.
    pub item_id: ItemId,
    pub action: AuditAction,
    pub details: String,
    pub fact: Option<MovementFact>,
    pub timestamp: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn created(item_id: ItemId, name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            action: AuditAction::Created,
            details: details::created(name),
            fact: None,
            timestamp,
        }
    }

    pub fn updated(item_id: ItemId, name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            action: AuditAction::Updated,
            details: details::updated(name),
            fact: None,
            timestamp,
        }
    }

    pub fn deleted(item_id: ItemId, name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            action: AuditAction::Deleted,
            details: details::deleted(name),
            fact: None,
            timestamp,
        }
    }

    pub fn sold(item_id: ItemId, fact: MovementFact, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            action: AuditAction::Sold,
            details: details::sold(fact.quantity, &fact.unit, &fact.item_name),
            fact: Some(fact),
            timestamp,
        }
    }

    pub fn restocked(item_id: ItemId, fact: MovementFact, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            action: AuditAction::Restocked,
            details: details::restocked(fact.quantity, &fact.unit, &fact.item_name),
            fact: Some(fact),
            timestamp,
        }
    }
}

/// A persisted audit entry. Never mutated or reordered after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: EntryId,
    pub item_id: ItemId,
    pub action: AuditAction,
    pub details: String,
    pub fact: Option<MovementFact>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Resolve the sale this entry describes: quantity and item name.
    ///
    /// The structured fact is authoritative when present; entries written
    /// before facts existed fall back to parsing `details`. Returns `None`
    /// for non-sale entries and unparseable legacy entries (fail-soft).
    pub fn sale(&self) -> Option<(String, i64)> {
        if self.action != AuditAction::Sold {
            return None;
        }
        if let Some(fact) = &self.fact {
            return Some((fact.item_name.clone(), fact.quantity));
        }
        details::parse_sold(&self.details).map(|p| (p.name, p.quantity))
    }
}
