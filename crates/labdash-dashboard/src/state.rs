//! View state of the admin dashboard
//!
//! A plain value: the service writes fetch results and messages into it, the
//! renderer reads snapshots of it. Every list is replaced wholesale.

use labdash_core::inventory::{
    self, Bar, CategoryFilter, InventoryQuery, RankedProduct, SalesEntry, SortKey, StockFilter,
};
use labdash_core::{Order, OrderBuckets, OrderTab, Product};

/// Bars drawn in the sales chart
pub const CHART_BARS: usize = 8;

/// Rows in the most popular products table
pub const POPULAR_PRODUCTS: usize = 5;

/// Everything the dashboard displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Orders split by tab
    pub orders: OrderBuckets,
    /// Products at or below their threshold
    pub low_stock: Vec<Product>,
    /// Every product
    pub products: Vec<Product>,
    /// Units sold per item, largest first
    pub sales: Vec<SalesEntry>,
    /// Persistent error or alert banner
    pub error: Option<String>,
    /// Self-clearing success banner
    pub success: Option<String>,
    /// Selected order tab
    pub active_tab: OrderTab,
    /// Inventory filter and sort selection
    pub query: InventoryQuery,
    /// Whether the low stock panel is expanded
    pub low_stock_expanded: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            orders: OrderBuckets::default(),
            low_stock: Vec::new(),
            products: Vec::new(),
            sales: Vec::new(),
            error: None,
            success: None,
            active_tab: OrderTab::default(),
            query: InventoryQuery::default(),
            low_stock_expanded: true,
        }
    }
}

impl ViewState {
    /// Replace the order buckets and the sales figures derived from them
    pub fn set_orders(&mut self, orders: Vec<Order>) {
        self.sales = inventory::sales_by_product(&orders);
        self.orders = OrderBuckets::partition(orders);
    }

    /// Replace the low stock list
    pub fn set_low_stock(&mut self, products: Vec<Product>) {
        self.low_stock = products;
    }

    /// Replace the product list
    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    /// Show an error banner, replacing any previous one
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Show a success banner, replacing any previous one
    pub fn set_success(&mut self, message: impl Into<String>) {
        self.success = Some(message.into());
    }

    /// Hide the error banner
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Hide the success banner
    pub fn dismiss_success(&mut self) {
        self.success = None;
    }

    /// Switch the visible order tab
    pub fn select_tab(&mut self, tab: OrderTab) {
        self.active_tab = tab;
    }

    /// Restrict the inventory table to a category
    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.query.category = filter;
    }

    /// Restrict the inventory table to a stock level
    pub fn set_stock_filter(&mut self, filter: StockFilter) {
        self.query.stock = filter;
    }

    /// Change the inventory sort order
    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
    }

    /// Expand or collapse the low stock panel
    pub fn toggle_low_stock_panel(&mut self) {
        self.low_stock_expanded = !self.low_stock_expanded;
    }

    /// Orders listed under the active tab
    #[must_use]
    pub fn visible_orders(&self) -> &[Order] {
        self.orders.get(self.active_tab)
    }

    /// Order count per tab, in tab order
    #[must_use]
    pub fn tab_counts(&self) -> [(OrderTab, usize); 3] {
        OrderTab::ALL.map(|tab| (tab, self.orders.get(tab).len()))
    }

    /// Inventory rows after filtering and sorting
    #[must_use]
    pub fn inventory(&self) -> Vec<Product> {
        self.query.apply(&self.products)
    }

    /// Best sellers with rank
    #[must_use]
    pub fn popular_products(&self) -> Vec<RankedProduct> {
        inventory::popular_products(&self.sales, POPULAR_PRODUCTS)
    }

    /// Sales chart bars
    #[must_use]
    pub fn sales_chart(&self) -> Vec<Bar> {
        inventory::bar_chart(&self.sales, CHART_BARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use labdash_core::{Category, OrderId, OrderStatus};
    use pretty_assertions::assert_eq;

    fn order(id: OrderId, item: &str, qty: u32, status: OrderStatus) -> Order {
        Order {
            id,
            username: None,
            item_name: item.to_string(),
            item_quantity: qty,
            status,
            created_on: Utc::now(),
        }
    }

    #[test]
    fn test_set_orders_partitions_and_derives_sales() {
        let mut view = ViewState::default();
        view.set_orders(vec![
            order(1, "Beaker", 2, OrderStatus::Pending),
            order(2, "Beaker", 3, OrderStatus::Processing),
            order(3, "Beaker", 4, OrderStatus::Processed),
            order(4, "Gloves", 9, OrderStatus::Cancelled),
        ]);

        assert_eq!(
            view.tab_counts(),
            [
                (OrderTab::Pending, 1),
                (OrderTab::Processing, 1),
                (OrderTab::Completed, 2)
            ]
        );
        assert_eq!(view.sales.len(), 1);
        assert_eq!(view.sales[0].value, 4);
        assert_eq!(view.popular_products()[0].badge(), "🥇");
        assert_eq!(view.sales_chart().len(), 1);
    }

    #[test]
    fn test_set_orders_replaces_wholesale() {
        let mut view = ViewState::default();
        view.set_orders(vec![order(1, "Beaker", 1, OrderStatus::Pending)]);
        view.set_orders(vec![order(2, "Gloves", 1, OrderStatus::Processing)]);

        assert!(view.orders.pending.is_empty());
        assert_eq!(view.orders.processing.len(), 1);
    }

    #[test]
    fn test_tab_selection_and_visible_orders() {
        let mut view = ViewState::default();
        view.set_orders(vec![
            order(1, "Beaker", 1, OrderStatus::Pending),
            order(2, "Gloves", 1, OrderStatus::Processed),
        ]);

        assert_eq!(view.visible_orders()[0].id, 1);
        view.select_tab(OrderTab::Completed);
        assert_eq!(view.visible_orders()[0].id, 2);
    }

    #[test]
    fn test_ui_operations() {
        let mut view = ViewState::default();
        view.set_products(vec![
            Product {
                id: 1,
                name: "Acetone".to_string(),
                category: Category::Chemicals,
                stock_quantity: 0,
                low_stock_threshold: 10,
                price: None,
                description: None,
            },
            Product {
                id: 2,
                name: "Beaker".to_string(),
                category: Category::Glassware,
                stock_quantity: 30,
                low_stock_threshold: 10,
                price: None,
                description: None,
            },
        ]);

        view.set_stock_filter(StockFilter::Out);
        assert_eq!(view.inventory().len(), 1);
        view.set_stock_filter(StockFilter::All);
        view.set_category_filter(CategoryFilter::Only(Category::Glassware));
        assert_eq!(view.inventory()[0].name, "Beaker");
        view.set_sort(SortKey::StockHigh);
        assert_eq!(view.query.sort, SortKey::StockHigh);

        assert!(view.low_stock_expanded);
        view.toggle_low_stock_panel();
        assert!(!view.low_stock_expanded);
        view.toggle_low_stock_panel();
        assert!(view.low_stock_expanded);

        view.set_error("boom");
        view.set_success("done");
        view.dismiss_error();
        view.dismiss_success();
        assert_eq!(view.error, None);
        assert_eq!(view.success, None);
    }
}
