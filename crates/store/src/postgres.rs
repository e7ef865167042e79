//! Postgres-backed store implementations.
//!
//! The two invariants the ledger leans on are enforced by the database
//! itself rather than by application-level read-modify-write:
//!
//! - **Name uniqueness**: a unique index on `(owner, name_key)`; violations
//!   (PG error code `23505`) are mapped to `DuplicateName`.
//! - **Stock floor**: `adjust_quantity` is a single conditional
//!   `UPDATE ... WHERE quantity + delta >= 0`, so two concurrent sells of
//!   the same item serialize inside Postgres and neither can observe a
//!   stale quantity.
//!
//! Everything else maps to `LedgerError::Storage` with the failing
//! operation named in the message.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use medledger_audit::{AuditAction, AuditEntry, MovementFact, NewAuditEntry};
use medledger_core::{EntryId, ItemId, LedgerError, LedgerResult, NameKey, Owner};
use medledger_inventory::{Item, ItemDraft, ItemPatch};

use crate::audit_log::AuditLog;
use crate::item_store::{ItemStore, UpdateOutcome};

use async_trait::async_trait;

/// Embedded schema migrations (`items`, `audit_entries`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Postgres-backed item store.
#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: Arc<PgPool>,
}

impl PostgresItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const ITEM_COLUMNS: &str = "id, owner, name, name_key, description, unit, quantity, \
     use_period_days, price, reorder_level, created_at, updated_at";

#[async_trait]
impl ItemStore for PostgresItemStore {
    #[instrument(skip(self, draft), fields(owner = %draft.owner, name = %draft.name), err)]
    async fn create(&self, draft: ItemDraft) -> LedgerResult<Item> {
        let now = Utc::now();
        let item = Item::from_draft(ItemId::new(), draft, now);

        sqlx::query(
            r#"
            INSERT INTO items (
                id, owner, name, name_key, description, unit, quantity,
                use_period_days, price, reorder_level, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.owner.as_str())
        .bind(&item.name)
        .bind(item.name_key.as_str())
        .bind(&item.description)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.use_period_days)
        .bind(item.price)
        .bind(item.reorder_level)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::duplicate_name(&item.name)
            } else {
                map_sqlx_error("create_item", e)
            }
        })?;

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get(&self, id: ItemId) -> LedgerResult<Item> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;

        row.map(|r| item_from_row(&r)).transpose()?.ok_or(LedgerError::NotFound)
    }

    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list_by_owner(&self, owner: &Owner) -> LedgerResult<Vec<Item>> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE owner = $1"))
            .bind(owner.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, patch), fields(item_id = %id), err)]
    async fn update(&self, id: ItemId, patch: ItemPatch) -> LedgerResult<(Item, UpdateOutcome)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Lock the row for the duration of the patch.
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("select_item_for_update", e))?;

        let Some(row) = row else {
            return Err(LedgerError::NotFound);
        };
        let mut item = item_from_row(&row)?;

        let changed = patch.apply_to(&mut item);
        item.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE items
            SET name = $2, name_key = $3, description = $4, unit = $5,
                quantity = $6, use_period_days = $7, price = $8,
                reorder_level = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.name_key.as_str())
        .bind(&item.description)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.use_period_days)
        .bind(item.price)
        .bind(item.reorder_level)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // A rename that collides with another live item trips the
            // (owner, name_key) unique index.
            if is_unique_violation(&e) {
                LedgerError::duplicate_name(&item.name)
            } else {
                map_sqlx_error("update_item", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let outcome = if changed {
            UpdateOutcome::Changed
        } else {
            UpdateOutcome::Unchanged
        };
        Ok((item, outcome))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> LedgerResult<Item> {
        let row = sqlx::query(&format!(
            "DELETE FROM items WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_item", e))?;

        row.map(|r| item_from_row(&r)).transpose()?.ok_or(LedgerError::NotFound)
    }

    #[instrument(skip(self), fields(item_id = %id, delta), err)]
    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> LedgerResult<Item> {
        // Single conditional statement: the floor check and the write are
        // one atomic operation, so concurrent adjustments cannot lose
        // updates or drive the quantity negative. The fallback branch reads
        // the same snapshot the update saw, so an `InsufficientStock` error
        // always reports the quantity that made the update fail.
        let row = sqlx::query(&format!(
            r#"
            WITH adjusted AS (
                UPDATE items
                SET quantity = quantity + $2, updated_at = $3
                WHERE id = $1 AND quantity + $2 >= 0
                RETURNING {ITEM_COLUMNS}
            )
            SELECT {ITEM_COLUMNS}, TRUE AS applied FROM adjusted
            UNION ALL
            SELECT {ITEM_COLUMNS}, FALSE AS applied FROM items
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM adjusted)
            "#
        ))
        .bind(id.as_uuid())
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("adjust_quantity", e))?;

        let Some(row) = row else {
            return Err(LedgerError::NotFound);
        };

        let applied: bool = row
            .try_get("applied")
            .map_err(|e| LedgerError::storage(format!("failed to read applied flag: {e}")))?;

        let item = item_from_row(&row)?;
        if applied {
            Ok(item)
        } else {
            Err(LedgerError::insufficient_stock(
                item.quantity,
                delta.saturating_neg(),
            ))
        }
    }

    #[instrument(skip(self, name), err)]
    async fn find_by_name(&self, name: &str) -> LedgerResult<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE name = $1 LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_item_by_name", e))?;

        row.map(|r| item_from_row(&r)).transpose()
    }
}

/// Postgres-backed audit log.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: Arc<PgPool>,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    #[instrument(skip(self, entry), fields(item_id = %entry.item_id, action = %entry.action), err)]
    async fn append(&self, entry: NewAuditEntry) -> LedgerResult<AuditEntry> {
        let id = EntryId::new();
        let fact = entry
            .fact
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| LedgerError::storage(format!("fact serialization failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO audit_entries (id, item_id, action, details, fact, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(entry.item_id.as_uuid())
        .bind(entry.action.as_str())
        .bind(&entry.details)
        .bind(fact)
        .bind(entry.timestamp)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_audit_entry", e))?;

        Ok(AuditEntry {
            id,
            item_id: entry.item_id,
            action: entry.action,
            details: entry.details,
            fact: entry.fact,
            timestamp: entry.timestamp,
        })
    }

    #[instrument(skip(self), err)]
    async fn recent(&self, limit: usize) -> LedgerResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, action, details, fact, occurred_at
            FROM audit_entries
            ORDER BY occurred_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_audit_entries", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), fields(action = %action), err)]
    async fn find_by_action(&self, action: AuditAction) -> LedgerResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, action, details, fact, occurred_at
            FROM audit_entries
            WHERE action = $1
            ORDER BY id ASC
            "#,
        )
        .bind(action.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_audit_entries_by_action", e))?;

        rows.iter().map(entry_from_row).collect()
    }
}

// SQLx row types

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    owner: String,
    name: String,
    name_key: String,
    description: String,
    unit: String,
    quantity: i64,
    use_period_days: i64,
    price: Decimal,
    reorder_level: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> LedgerResult<Item> {
    let row = ItemRow::from_row(row)
        .map_err(|e| LedgerError::storage(format!("failed to deserialize item row: {e}")))?;

    // `name_key` is persisted (the unique index needs it) but is always a
    // derivation of `name`; a mismatch means the row was written by
    // something other than this store.
    let name_key = NameKey::of(&row.name);
    if name_key.as_str() != row.name_key {
        tracing::warn!(item_id = %row.id, "stored name_key disagrees with derived key");
    }

    Ok(Item {
        id: ItemId::from_uuid(row.id),
        owner: Owner::new(row.owner),
        name: row.name,
        name_key,
        description: row.description,
        unit: row.unit,
        quantity: row.quantity,
        use_period_days: row.use_period_days,
        price: row.price,
        reorder_level: row.reorder_level,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    id: Uuid,
    item_id: Uuid,
    action: String,
    details: String,
    fact: Option<serde_json::Value>,
    occurred_at: DateTime<Utc>,
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> LedgerResult<AuditEntry> {
    let row = AuditEntryRow::from_row(row)
        .map_err(|e| LedgerError::storage(format!("failed to deserialize audit row: {e}")))?;

    let action: AuditAction = row
        .action
        .parse()
        .map_err(|_| LedgerError::storage(format!("unknown audit action in row: {}", row.action)))?;

    let fact: Option<MovementFact> = row
        .fact
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| LedgerError::storage(format!("failed to deserialize movement fact: {e}")))?;

    Ok(AuditEntry {
        id: EntryId::from_uuid(row.id),
        item_id: ItemId::from_uuid(row.item_id),
        action,
        details: row.details,
        fact,
        timestamp: row.occurred_at,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::Database(db_err) => LedgerError::storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            LedgerError::storage(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            // Should not happen: lookups use fetch_optional/fetch_all.
            LedgerError::storage(format!("unexpected row not found in {operation}"))
        }
        _ => LedgerError::storage(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation (PG code 23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
