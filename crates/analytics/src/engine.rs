use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medledger_audit::AuditAction;
use medledger_core::{LedgerResult, Owner};
use medledger_inventory::Item;
use medledger_store::{AuditLog, ItemStore};

/// Horizon used by the dashboard's expiring-soon count.
pub const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 30;

/// What a sales-over-time point measures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesMode {
    /// Count of sale events per day — not units sold.
    Quantity,
    /// Units sold priced at the item's **current** price.
    Revenue,
}

/// One day of sales activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    /// UTC calendar date of the underlying entries.
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Aggregate sales for one item name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSellingItem {
    pub name: String,
    pub units: i64,
    pub revenue: Decimal,
}

/// Counts backing the dashboard's summary card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_items: usize,
    pub low_stock: usize,
    pub expiring_soon: usize,
}

/// Read-only analytics over an item store and audit log.
///
/// Takes the same kind of explicit store handles as the ledger; typically
/// constructed with clones of the same `Arc`s.
#[derive(Debug)]
pub struct Analytics<S, A> {
    items: S,
    audit: A,
}

impl<S, A> Analytics<S, A>
where
    S: ItemStore,
    A: AuditLog,
{
    pub fn new(items: S, audit: A) -> Self {
        Self { items, audit }
    }

    /// Daily sales, ascending by date.
    ///
    /// `Quantity` mode counts sale events (every `sold` entry contributes
    /// 1, regardless of how many units it moved). `Revenue` mode prices
    /// each sale's quantity at the current price of the item found by exact
    /// name; sales whose item no longer resolves contribute 0, and legacy
    /// entries that cannot be parsed are skipped.
    pub async fn sales_over_time(&self, mode: SalesMode) -> LedgerResult<Vec<SalesPoint>> {
        let entries = self.audit.find_by_action(AuditAction::Sold).await?;

        let mut prices: HashMap<String, Option<Decimal>> = HashMap::new();
        let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

        for entry in &entries {
            let date = entry.timestamp.date_naive();
            let value = match mode {
                SalesMode::Quantity => Decimal::ONE,
                SalesMode::Revenue => {
                    let Some((name, quantity)) = entry.sale() else {
                        continue; // unparseable legacy entry
                    };
                    match self.price_of(&mut prices, &name).await? {
                        Some(price) => price * Decimal::from(quantity),
                        None => Decimal::ZERO,
                    }
                }
            };
            *days.entry(date).or_insert(Decimal::ZERO) += value;
        }

        Ok(days
            .into_iter()
            .map(|(date, value)| SalesPoint { date, value })
            .collect())
    }

    /// The `limit` item names with the highest revenue, descending.
    ///
    /// Names whose revenue works out to zero (item gone, or free) are
    /// dropped rather than reported as zero rows.
    pub async fn top_selling(&self, limit: usize) -> LedgerResult<Vec<TopSellingItem>> {
        let entries = self.audit.find_by_action(AuditAction::Sold).await?;

        let mut prices: HashMap<String, Option<Decimal>> = HashMap::new();
        let mut totals: HashMap<String, (i64, Decimal)> = HashMap::new();

        for entry in &entries {
            let Some((name, quantity)) = entry.sale() else {
                continue;
            };
            let revenue = match self.price_of(&mut prices, &name).await? {
                Some(price) => price * Decimal::from(quantity),
                None => Decimal::ZERO,
            };
            let total = totals.entry(name).or_insert((0, Decimal::ZERO));
            total.0 += quantity;
            total.1 += revenue;
        }

        let mut ranked: Vec<TopSellingItem> = totals
            .into_iter()
            .filter(|(_, (_, revenue))| *revenue > Decimal::ZERO)
            .map(|(name, (units, revenue))| TopSellingItem {
                name,
                units,
                revenue,
            })
            .collect();

        // Revenue descending; name as a deterministic tie-break.
        ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Items of this owner expiring within `(now, now + horizon_days]`.
    pub async fn expiring_soon(
        &self,
        owner: &Owner,
        horizon_days: i64,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<Item>> {
        let horizon = now + Duration::days(horizon_days);
        let items = self.items.list_by_owner(owner).await?;
        Ok(items
            .into_iter()
            .filter(|i| {
                let expires = i.expires_at();
                expires > now && expires <= horizon
            })
            .collect())
    }

    /// Dashboard counts: total items, low-stock items, and items expiring
    /// within the default horizon.
    pub async fn stock_summary(
        &self,
        owner: &Owner,
        now: DateTime<Utc>,
    ) -> LedgerResult<StockSummary> {
        let items = self.items.list_by_owner(owner).await?;
        let horizon = now + Duration::days(DEFAULT_EXPIRY_HORIZON_DAYS);

        let mut summary = StockSummary {
            total_items: items.len(),
            low_stock: 0,
            expiring_soon: 0,
        };
        for item in &items {
            if item.is_low_stock() {
                summary.low_stock += 1;
            }
            let expires = item.expires_at();
            if expires > now && expires <= horizon {
                summary.expiring_soon += 1;
            }
        }
        Ok(summary)
    }

    /// Current-price lookup by exact name, memoized per computation.
    async fn price_of(
        &self,
        cache: &mut HashMap<String, Option<Decimal>>,
        name: &str,
    ) -> LedgerResult<Option<Decimal>> {
        if let Some(price) = cache.get(name) {
            return Ok(*price);
        }
        let price = self.items.find_by_name(name).await?.map(|i| i.price);
        cache.insert(name.to_string(), price);
        Ok(price)
    }
}
