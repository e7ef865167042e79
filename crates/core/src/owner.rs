//! Value objects: the owning identity of an item and the case-folded name key.
//!
//! Both are **immutable** and compared by value. `Owner` is supplied by an
//! external identity provider and trusted as given; `NameKey` is always
//! derived from a display name, never constructed from raw input.

use serde::{Deserialize, Serialize};

/// Identity (email-shaped string) that scopes visibility of items.
///
/// The ledger does not authenticate this value; it is whatever the identity
/// provider handed the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Owner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Owner {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Case-folded form of an item name, used to enforce per-owner uniqueness.
///
/// Recomputed whenever the display name changes; two names that differ only
/// by case (or surrounding whitespace) fold to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameKey(String);

impl NameKey {
    /// Derive the key from a display name.
    pub fn of(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NameKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keys_fold_case() {
        assert_eq!(NameKey::of("Aspirin"), NameKey::of("aspirin"));
        assert_eq!(NameKey::of("ASPIRIN"), NameKey::of("aSpIrIn"));
    }

    #[test]
    fn keys_trim_surrounding_whitespace() {
        assert_eq!(NameKey::of("  Aspirin "), NameKey::of("Aspirin"));
    }

    #[test]
    fn distinct_names_keep_distinct_keys() {
        assert_ne!(NameKey::of("Aspirin"), NameKey::of("Ibuprofen"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: deriving a key is idempotent (folding a folded name is a no-op).
        #[test]
        fn name_key_is_idempotent(name in "\\PC{0,40}") {
            let once = NameKey::of(&name);
            let twice = NameKey::of(once.as_str());
            prop_assert_eq!(once, twice);
        }

        /// Property: keys are case-insensitive for ASCII names.
        #[test]
        fn ascii_case_variants_collide(name in "[A-Za-z][A-Za-z0-9 ]{0,30}") {
            prop_assert_eq!(
                NameKey::of(&name.to_uppercase()),
                NameKey::of(&name.to_lowercase())
            );
        }
    }
}
