//! `medledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod owner;

pub use error::{LedgerError, LedgerResult};
pub use id::{EntryId, ItemId};
pub use owner::{NameKey, Owner};
