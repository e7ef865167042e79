//! Integration tests for the ledger over the in-memory stores.
//!
//! Verifies:
//! - Per-owner case-insensitive name uniqueness
//! - The atomic stock floor under concurrent sells
//! - Audit completeness (one entry per successful mutation, exact details)
//! - The NotFound / Unchanged split on updates

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use medledger_audit::AuditAction;
    use medledger_core::{ItemId, LedgerError, Owner};
    use medledger_inventory::{ItemDraft, ItemPatch};
    use medledger_store::{AuditLog, InMemoryAuditLog, InMemoryItemStore, UpdateOutcome};

    use crate::Ledger;

    type TestLedger = Ledger<Arc<InMemoryItemStore>, Arc<InMemoryAuditLog>>;

    fn setup() -> (TestLedger, Arc<InMemoryItemStore>, Arc<InMemoryAuditLog>) {
        let items = Arc::new(InMemoryItemStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        (Ledger::new(items.clone(), audit.clone()), items, audit)
    }

    fn draft(owner: &str, name: &str, quantity: i64) -> ItemDraft {
        ItemDraft {
            owner: Owner::from(owner),
            name: name.to_string(),
            description: "test".to_string(),
            unit: "tablets".to_string(),
            quantity,
            use_period_days: 365,
            price: Decimal::new(20, 1), // 2.0
            reorder_level: 5,
        }
    }

    #[tokio::test]
    async fn create_writes_item_and_audit_entry() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 100)).await.unwrap();

        let entries = audit.find_by_action(AuditAction::Created).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_id, item.id);
        assert_eq!(entries[0].details, "Created new item: Aspirin");
        assert!(entries[0].fact.is_none());
    }

    #[tokio::test]
    async fn names_differing_only_by_case_collide() {
        let (ledger, _, audit) = setup();
        let first = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();

        let err = ledger
            .create_item(draft("a@x.com", "aspirin", 5))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::duplicate_name("aspirin"));

        // First item untouched, and no second audit entry.
        assert_eq!(ledger.get_item(first.id).await.unwrap(), first);
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_writes_nothing() {
        let (ledger, _, audit) = setup();
        let mut bad = draft("a@x.com", "Aspirin", 10);
        bad.quantity = -1;

        let err = ledger.create_item(bad).await.unwrap_err();
        assert_eq!(err.code(), "validation_error");
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn sell_appends_exact_details_and_fact() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 100)).await.unwrap();

        let after = ledger.sell_item(item.id, 3).await.unwrap();
        assert_eq!(after.quantity, 97);

        let sold = audit.find_by_action(AuditAction::Sold).await.unwrap();
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].details, "Sold 3 tablets of Aspirin");
        let fact = sold[0].fact.as_ref().unwrap();
        assert_eq!(fact.item_name, "Aspirin");
        assert_eq!(fact.quantity, 3);
        assert_eq!(fact.unit_price, Decimal::new(20, 1));
    }

    #[tokio::test]
    async fn restock_appends_exact_details_and_fact() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();

        let after = ledger.restock_item(item.id, 40).await.unwrap();
        assert_eq!(after.quantity, 50);

        let restocked = audit.find_by_action(AuditAction::Restocked).await.unwrap();
        assert_eq!(restocked.len(), 1);
        assert_eq!(restocked[0].details, "Restocked 40 tablets of Aspirin");
        assert!(restocked[0].fact.is_some());
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected_before_any_write() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();
        let before = audit.len();

        for qty in [0, -3] {
            assert_eq!(
                ledger.sell_item(item.id, qty).await.unwrap_err().code(),
                "validation_error"
            );
            assert_eq!(
                ledger.restock_item(item.id, qty).await.unwrap_err().code(),
                "validation_error"
            );
        }

        assert_eq!(ledger.get_item(item.id).await.unwrap().quantity, 10);
        assert_eq!(audit.len(), before);
    }

    #[tokio::test]
    async fn oversell_fails_without_an_audit_entry() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 5)).await.unwrap();

        let err = ledger.sell_item(item.id, 6).await.unwrap_err();
        assert_eq!(err, LedgerError::insufficient_stock(5, 6));
        assert_eq!(ledger.get_item(item.id).await.unwrap().quantity, 5);
        assert!(audit.find_by_action(AuditAction::Sold).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_sells_never_breach_the_floor() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 5)).await.unwrap();
        let ledger = Arc::new(ledger);

        // Ten concurrent sells of 1 against a stock of 5: exactly five fit.
        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = ledger.clone();
            let id = item.id;
            handles.push(tokio::spawn(async move { ledger.sell_item(id, 1).await }));
        }

        let mut succeeded = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(LedgerError::InsufficientStock { .. }) => insufficient += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(insufficient, 5);
        assert_eq!(ledger.get_item(item.id).await.unwrap().quantity, 0);

        // One sold entry per successful sell, none for the failures.
        let sold = audit.find_by_action(AuditAction::Sold).await.unwrap();
        assert_eq!(sold.len(), 5);
    }

    #[tokio::test]
    async fn update_uses_the_post_update_name() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();

        let patch = ItemPatch {
            name: Some("Ibuprofen".to_string()),
            ..Default::default()
        };
        let (updated, outcome) = ledger.update_item(item.id, patch).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Changed);
        assert_eq!(updated.name, "Ibuprofen");

        let entries = audit.find_by_action(AuditAction::Updated).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details, "Updated item: Ibuprofen");
    }

    #[tokio::test]
    async fn empty_update_is_distinguishable_from_not_found() {
        let (ledger, _, _) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();

        let (updated, outcome) = ledger
            .update_item(item.id, ItemPatch::default())
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);

        // Identical except for updated_at.
        let mut stripped = updated;
        stripped.updated_at = item.updated_at;
        assert_eq!(stripped, item);

        let err = ledger
            .update_item(ItemId::new(), ItemPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::NotFound);
    }

    #[tokio::test]
    async fn delete_records_the_pre_deletion_name_and_keeps_history() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();
        ledger.sell_item(item.id, 2).await.unwrap();

        ledger.delete_item(item.id).await.unwrap();
        assert_eq!(ledger.get_item(item.id).await.unwrap_err().code(), "not_found");

        let deleted = audit.find_by_action(AuditAction::Deleted).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].details, "Deleted item: Aspirin");

        // No cascade: the sold entry outlives the item.
        let sold = audit.find_by_action(AuditAction::Sold).await.unwrap();
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].item_id, item.id);
    }

    #[tokio::test]
    async fn every_successful_mutation_appends_exactly_one_entry() {
        let (ledger, _, audit) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();
        ledger
            .update_item(item.id, ItemPatch::default())
            .await
            .unwrap();
        ledger.sell_item(item.id, 1).await.unwrap();
        ledger.restock_item(item.id, 1).await.unwrap();
        ledger.delete_item(item.id).await.unwrap();

        assert_eq!(audit.len(), 5);
        for action in [
            AuditAction::Created,
            AuditAction::Updated,
            AuditAction::Sold,
            AuditAction::Restocked,
            AuditAction::Deleted,
        ] {
            assert_eq!(audit.find_by_action(action).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn low_stock_boundary_is_inclusive() {
        let (ledger, _, _) = setup();
        let owner = Owner::from("a@x.com");

        // reorder_level is 5 in the draft.
        let at = ledger.create_item(draft("a@x.com", "AtLevel", 5)).await.unwrap();
        let above = ledger.create_item(draft("a@x.com", "Above", 6)).await.unwrap();

        let low = ledger.low_stock(&owner).await.unwrap();
        assert!(low.iter().any(|i| i.id == at.id));
        assert!(!low.iter().any(|i| i.id == above.id));
    }

    #[tokio::test]
    async fn low_stock_is_owner_scoped() {
        let (ledger, _, _) = setup();
        ledger.create_item(draft("a@x.com", "Aspirin", 0)).await.unwrap();
        ledger.create_item(draft("b@x.com", "Aspirin", 0)).await.unwrap();

        let low = ledger.low_stock(&Owner::from("a@x.com")).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].owner, Owner::from("a@x.com"));
    }

    #[tokio::test]
    async fn recent_activity_is_newest_first() {
        let (ledger, _, _) = setup();
        let item = ledger.create_item(draft("a@x.com", "Aspirin", 10)).await.unwrap();
        ledger.sell_item(item.id, 1).await.unwrap();
        ledger.restock_item(item.id, 2).await.unwrap();

        let activity = ledger.recent_activity(2).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].action, AuditAction::Restocked);
        assert_eq!(activity[1].action, AuditAction::Sold);
    }
}
