//! Storage layer: the `ItemStore` and `AuditLog` seams plus their two
//! implementations.
//!
//! - **In-memory** (`RwLock<HashMap>` / `RwLock<Vec>`): tests and dev.
//! - **Postgres** (`sqlx`): production; the stock floor and name uniqueness
//!   are enforced by the database itself (conditional update, unique index).
//!
//! Store handles are constructed once at process start and passed into the
//! ledger and analytics by the caller. There is no ambient global state.

pub mod audit_log;
pub mod in_memory;
pub mod item_store;
pub mod postgres;

pub use audit_log::AuditLog;
pub use in_memory::{InMemoryAuditLog, InMemoryItemStore};
pub use item_store::{ItemStore, UpdateOutcome};
pub use postgres::{PostgresAuditLog, PostgresItemStore, MIGRATOR};
