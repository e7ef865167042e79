//! Inventory domain module.
//!
//! This crate contains the item entity and its write payloads, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{Item, ItemDraft, ItemPatch};
