//! Core data types for the labdash dashboard
//!
//! These mirror the records served by the inventory backend. The client never
//! edits them in place: every fetch replaces the previous copy wholesale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order identifier type
pub type OrderId = u64;

/// Product identifier type
pub type ProductId = u64;

/// Lifecycle status of an order, exactly as the backend spells it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed by a customer, waiting for an operator
    Pending,
    /// Accepted by an operator and queued for fulfilment
    Processing,
    /// Fulfilled
    Processed,
    /// Cancelled by an operator
    Cancelled,
}

impl OrderStatus {
    /// The display bucket this status belongs to
    #[must_use]
    pub const fn tab(self) -> OrderTab {
        match self {
            Self::Pending => OrderTab::Pending,
            Self::Processing => OrderTab::Processing,
            Self::Processed | Self::Cancelled => OrderTab::Completed,
        }
    }

    /// Wire spelling of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Processed => "Processed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three mutually exclusive order groupings shown as tabs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderTab {
    /// Orders awaiting an accept/cancel decision
    #[default]
    Pending,
    /// Orders being fulfilled
    Processing,
    /// Processed and cancelled orders
    Completed,
}

impl OrderTab {
    /// All tabs in display order
    pub const ALL: [Self; 3] = [Self::Pending, Self::Processing, Self::Completed];

    /// Lowercase identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }

    /// Human readable title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for OrderTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderTab {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            other => Err(crate::Error::unknown_variant("order tab", other)),
        }
    }
}

/// A customer order as listed by the admin endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,

    /// Customer who placed the order
    #[serde(default)]
    pub username: Option<String>,

    /// Name of the ordered item
    pub item_name: String,

    /// Ordered quantity
    pub item_quantity: u32,

    /// Current lifecycle status
    pub status: OrderStatus,

    /// When the order was placed
    pub created_on: DateTime<Utc>,
}

/// Product category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Beakers, flasks, pipettes
    Glassware,
    /// Reagents and solvents
    Chemicals,
    /// Instruments
    Equipment,
    /// Single-use supplies
    Consumables,
    /// Protective gear
    Safety,
}

impl Category {
    /// All categories in menu order
    pub const ALL: [Self; 5] = [
        Self::Glassware,
        Self::Chemicals,
        Self::Equipment,
        Self::Consumables,
        Self::Safety,
    ];

    /// Wire identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Glassware => "glassware",
            Self::Chemicals => "chemicals",
            Self::Equipment => "equipment",
            Self::Consumables => "consumables",
            Self::Safety => "safety",
        }
    }

    /// Capitalized display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Glassware => "Glassware",
            Self::Chemicals => "Chemicals",
            Self::Equipment => "Equipment",
            Self::Consumables => "Consumables",
            Self::Safety => "Safety",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| crate::Error::unknown_variant("category", s))
    }
}

/// Backend default for `low_stock_threshold` when a record omits it
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

const fn default_low_stock_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// An inventory product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product category
    pub category: Category,

    /// Units currently in stock
    pub stock_quantity: u32,

    /// Quantity at or below which the backend flags the product
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,

    /// Unit price, sent by the backend as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// No units left
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock_quantity == 0
    }

    /// At or below the replenishment threshold (includes out of stock)
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }

    /// Three-way stock classification used by the inventory table
    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        if self.is_out_of_stock() {
            StockStatus::OutOfStock
        } else if self.is_low_stock() {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Stock classification of a single product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    /// Zero units
    OutOfStock,
    /// Between one unit and the threshold
    LowStock,
    /// Above the threshold
    InStock,
}

impl StockStatus {
    /// Machine identifier (`out-of-stock`, `low-stock`, `in-stock`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfStock => "out-of-stock",
            Self::LowStock => "low-stock",
            Self::InStock => "in-stock",
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
            Self::InStock => "In Stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Low-stock notice attached to an accept response or pushed as a live event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LowStockAlert {
    /// Affected product, when the backend includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,

    /// Affected product name
    pub product_name: String,

    /// Units left after the triggering change
    pub remaining_stock: u32,

    /// Threshold that was crossed, when included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
}

impl LowStockAlert {
    /// Create an alert with only the fields the banner needs
    pub fn new(product_name: impl Into<String>, remaining_stock: u32) -> Self {
        Self {
            product_id: None,
            product_name: product_name.into(),
            remaining_stock,
            threshold: None,
        }
    }

    /// Banner text shown in the error slot
    #[must_use]
    pub fn banner(&self) -> String {
        format!(
            "⚠️ Low Stock Alert: {} has only {} left!",
            self.product_name, self.remaining_stock
        )
    }
}

/// Orders split by display tab
///
/// Built only through [`OrderBuckets::partition`], which places every order in
/// exactly one bucket and keeps the fetch order inside each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBuckets {
    /// `Pending` orders
    pub pending: Vec<Order>,
    /// `Processing` orders
    pub processing: Vec<Order>,
    /// `Processed` and `Cancelled` orders
    pub completed: Vec<Order>,
}

impl OrderBuckets {
    /// Partition a fetched order list by status
    pub fn partition<I>(orders: I) -> Self
    where
        I: IntoIterator<Item = Order>,
    {
        let mut buckets = Self::default();
        for order in orders {
            match order.status.tab() {
                OrderTab::Pending => buckets.pending.push(order),
                OrderTab::Processing => buckets.processing.push(order),
                OrderTab::Completed => buckets.completed.push(order),
            }
        }
        buckets
    }

    /// Orders shown under `tab`
    #[must_use]
    pub fn get(&self, tab: OrderTab) -> &[Order] {
        match tab {
            OrderTab::Pending => &self.pending,
            OrderTab::Processing => &self.processing,
            OrderTab::Completed => &self.completed,
        }
    }

    /// Whether `tab` currently lists the order `id`
    #[must_use]
    pub fn contains(&self, tab: OrderTab, id: OrderId) -> bool {
        self.get(tab).iter().any(|o| o.id == id)
    }

    /// Total number of orders across all buckets
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.processing.len() + self.completed.len()
    }

    /// True when no bucket holds an order
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every order regardless of bucket
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.pending
            .iter()
            .chain(self.processing.iter())
            .chain(self.completed.iter())
    }
}
