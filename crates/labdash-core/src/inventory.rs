//! Inventory table filtering and sales summaries derived from fetched data

use crate::types::{Category, Order, OrderStatus, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Category selector of the inventory table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// Every category
    #[default]
    All,
    /// A single category
    Only(Category),
}

impl CategoryFilter {
    fn matches(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => product.category == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All Categories"),
            Self::Only(category) => write!(f, "{category}"),
        }
    }
}

/// Stock level selector of the inventory table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockFilter {
    /// No stock restriction
    #[default]
    All,
    /// Above the threshold
    In,
    /// In stock but at or below the threshold
    Low,
    /// Zero units
    Out,
}

impl StockFilter {
    const fn matches(self, product: &Product) -> bool {
        let quantity = product.stock_quantity;
        let threshold = product.low_stock_threshold;
        match self {
            Self::All => true,
            Self::In => quantity > threshold,
            Self::Low => quantity > 0 && quantity <= threshold,
            Self::Out => quantity == 0,
        }
    }
}

impl FromStr for StockFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "in" => Ok(Self::In),
            "low" => Ok(Self::Low),
            "out" => Ok(Self::Out),
            other => Err(crate::Error::unknown_variant("stock filter", other)),
        }
    }
}

impl fmt::Display for StockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All Stock Levels",
            Self::In => "In Stock",
            Self::Low => "Low Stock",
            Self::Out => "Out of Stock",
        })
    }
}

/// Sort order of the inventory table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Product name, case-insensitive
    #[default]
    Name,
    /// Stock ascending
    StockLow,
    /// Stock descending
    StockHigh,
    /// Category identifier
    Category,
}

impl FromStr for SortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "stock-low" => Ok(Self::StockLow),
            "stock-high" => Ok(Self::StockHigh),
            "category" => Ok(Self::Category),
            other => Err(crate::Error::unknown_variant("sort key", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "Sort by Name",
            Self::StockLow => "Stock: Low to High",
            Self::StockHigh => "Stock: High to Low",
            Self::Category => "Sort by Category",
        })
    }
}

/// Filter and sort selection for the inventory table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryQuery {
    /// Category selector
    pub category: CategoryFilter,
    /// Stock level selector
    pub stock: StockFilter,
    /// Row order
    pub sort: SortKey,
}

impl InventoryQuery {
    /// Apply category filter, then stock filter, then a stable sort
    #[must_use]
    pub fn apply(self, products: &[Product]) -> Vec<Product> {
        let mut rows: Vec<Product> = products
            .iter()
            .filter(|p| self.category.matches(p) && self.stock.matches(p))
            .cloned()
            .collect();

        match self.sort {
            SortKey::Name => rows.sort_by_cached_key(|p| p.name.to_lowercase()),
            SortKey::StockLow => rows.sort_by_key(|p| p.stock_quantity),
            SortKey::StockHigh => rows.sort_by(|a, b| b.stock_quantity.cmp(&a.stock_quantity)),
            SortKey::Category => rows.sort_by_key(|p| p.category.as_str()),
        }

        rows
    }
}

/// Fill percentage of a stock bar
///
/// `visual_max` is a presentation scale, not a backend limit; quantities above
/// it render as a full bar.
#[must_use]
pub fn stock_percentage(product: &Product, visual_max: u32) -> f64 {
    if visual_max == 0 {
        return 100.0;
    }
    let ratio = f64::from(product.stock_quantity) / f64::from(visual_max);
    (ratio * 100.0).min(100.0)
}

/// Units sold for one item name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntry {
    /// Item name
    pub label: String,
    /// Total units over processed orders
    pub value: u64,
}

/// Sum processed quantities per item, largest first
///
/// Only `Processed` orders count; cancelled orders never sold anything.
#[must_use]
pub fn sales_by_product<'a, I>(orders: I) -> Vec<SalesEntry>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for order in orders {
        if order.status == OrderStatus::Processed {
            *totals.entry(order.item_name.as_str()).or_default() +=
                u64::from(order.item_quantity);
        }
    }

    let mut entries: Vec<SalesEntry> = totals
        .into_iter()
        .map(|(label, value)| SalesEntry {
            label: label.to_string(),
            value,
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    entries
}

/// A row of the "most popular products" table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedProduct {
    /// 1-based rank
    pub rank: usize,
    /// Sales entry at this rank
    pub entry: SalesEntry,
}

impl RankedProduct {
    /// Medal for the podium, `#n` below it
    #[must_use]
    pub fn badge(&self) -> String {
        match self.rank {
            1 => "🥇".to_string(),
            2 => "🥈".to_string(),
            3 => "🥉".to_string(),
            n => format!("#{n}"),
        }
    }
}

/// Top `limit` entries of an already sorted sales list
#[must_use]
pub fn popular_products(sales: &[SalesEntry], limit: usize) -> Vec<RankedProduct> {
    sales
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, entry)| RankedProduct {
            rank: i + 1,
            entry: entry.clone(),
        })
        .collect()
}

/// One bar of the sales chart
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Label shortened for the axis
    pub label: String,
    /// Untruncated label
    pub full_label: String,
    /// Units sold
    pub value: u64,
    /// Height relative to the tallest bar, 0-100
    pub height_percent: f64,
}

/// Chart bars for the first `max_bars` sales entries
#[must_use]
pub fn bar_chart(sales: &[SalesEntry], max_bars: usize) -> Vec<Bar> {
    let max_value = sales.iter().map(|e| e.value).max().unwrap_or(0);

    sales
        .iter()
        .take(max_bars)
        .map(|entry| {
            #[allow(clippy::cast_precision_loss)]
            let height_percent = if max_value == 0 {
                0.0
            } else {
                entry.value as f64 / max_value as f64 * 100.0
            };
            Bar {
                label: truncate_label(&entry.label, 10),
                full_label: entry.label.clone(),
                value: entry.value,
                height_percent,
            }
        })
        .collect()
}

/// Cut `label` to `max_chars` characters, marking the cut with `...`
#[must_use]
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() > max_chars {
        let head: String = label.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}
