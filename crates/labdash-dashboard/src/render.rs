//! Plain-text rendering of the dashboard

use crate::state::ViewState;
use labdash_core::inventory::stock_percentage;
use labdash_core::{Order, OrderTab, Product};
use std::fmt::Write;

const STOCK_BAR_WIDTH: usize = 10;
const CHART_WIDTH: usize = 30;

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Error and success banners, one per line
#[must_use]
pub fn render_messages(view: &ViewState) -> String {
    let mut out = String::new();
    if let Some(ref error) = view.error {
        let _ = writeln!(out, "[!] {error}");
    }
    if let Some(ref success) = view.success {
        let _ = writeln!(out, "[ok] {success}");
    }
    out
}

/// Tab strip with counts, the active tab bracketed
#[must_use]
pub fn render_tabs(view: &ViewState) -> String {
    view.tab_counts()
        .iter()
        .map(|(tab, count)| {
            if *tab == view.active_tab {
                format!("[{} ({count})]", tab.title())
            } else {
                format!(" {} ({count}) ", tab.title())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Order table
#[must_use]
pub fn render_orders(orders: &[Order], tab: OrderTab) -> String {
    if orders.is_empty() {
        return format!("No {} orders\n", tab.as_str());
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:<16}  {:<28}  {:>5}  {:<10}  {:<16}",
        "ID", "Customer", "Item", "Qty", "Status", "Placed"
    );
    for order in orders {
        let _ = writeln!(
            out,
            "{:>6}  {:<16}  {:<28}  {:>5}  {:<10}  {:<16}",
            format!("#{}", order.id),
            order.username.as_deref().unwrap_or("-"),
            order.item_name,
            order.item_quantity,
            order.status.as_str(),
            order.created_on.format("%Y-%m-%d %H:%M"),
        );
    }
    out
}

/// Inventory table with a stock bar per row
#[must_use]
pub fn render_inventory(products: &[Product], visual_max: u32) -> String {
    if products.is_empty() {
        return "No products match the current filters\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<28}  {:<12}  {:>9}  {:>6}  {:>9}  {:<12}  Level",
        "Product", "Category", "Price", "Stock", "Threshold", "Status"
    );
    for product in products {
        let _ = writeln!(
            out,
            "{:<28}  {:<12}  {:>9}  {:>6}  {:>9}  {:<12}  {}",
            product.name,
            product.category.label(),
            product
                .price
                .map_or_else(|| "-".to_string(), |price| format!("${price:.2}")),
            product.stock_quantity,
            product.low_stock_threshold,
            product.stock_status().label(),
            bar(stock_percentage(product, visual_max), STOCK_BAR_WIDTH),
        );
    }
    out
}

/// Low stock panel; empty when nothing is low, lists products when expanded
#[must_use]
pub fn render_low_stock(view: &ViewState) -> String {
    if view.low_stock.is_empty() {
        return String::new();
    }

    let mut out = format!("Low stock: {} product(s)", view.low_stock.len());
    if !view.low_stock_expanded {
        out.push('\n');
        return out;
    }
    out.push_str(":\n");
    for product in &view.low_stock {
        let _ = writeln!(
            out,
            "  - [{}] {} ({}): {} left, threshold {}",
            product.stock_status().label(),
            product.name,
            product.category.label(),
            product.stock_quantity,
            product.low_stock_threshold
        );
    }
    out
}

/// Top sellers and the sales bar chart
#[must_use]
pub fn render_sales(view: &ViewState) -> String {
    let popular = view.popular_products();
    if popular.is_empty() {
        return "No processed orders yet\n".to_string();
    }

    let mut out = String::from("Most popular products:\n");
    for ranked in &popular {
        let _ = writeln!(
            out,
            "  {:<4} {:<28} {} sold",
            ranked.badge(),
            ranked.entry.label,
            ranked.entry.value
        );
    }

    out.push_str("Sales by product:\n");
    for entry in view.sales_chart() {
        let _ = writeln!(
            out,
            "  {:<13} {} {}",
            entry.label,
            bar(entry.height_percent, CHART_WIDTH),
            entry.value
        );
    }
    out
}

/// The whole dashboard
#[must_use]
pub fn render_dashboard(view: &ViewState, visual_max: u32) -> String {
    let mut out = String::from("Lab Management Portal - Admin Dashboard\n\n");
    out.push_str(&render_messages(view));
    out.push_str(&render_tabs(view));
    out.push_str("\n\n");
    out.push_str(&render_orders(view.visible_orders(), view.active_tab));
    out.push('\n');
    let low_stock = render_low_stock(view);
    if !low_stock.is_empty() {
        out.push_str(&low_stock);
        out.push('\n');
    }
    out.push_str(&render_sales(view));
    out.push('\n');
    let _ = writeln!(
        out,
        "Inventory ({} / {} / {}):",
        view.query.category, view.query.stock, view.query.sort
    );
    out.push_str(&render_inventory(&view.inventory(), visual_max));
    out
}
