//! In-memory backend for testing
//!
//! Mimics the order transitions of the real service: accepting moves a
//! `Pending` order to `Processing` and decrements the stock of the product
//! with the same name, cancelling moves a non-final order to `Cancelled`.

use crate::api_client::{AcceptOutcome, InventoryBackend};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use labdash_core::{LowStockAlert, Order, OrderId, OrderStatus, Product};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Number of calls made to each endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `fetch_orders` calls
    pub orders: usize,
    /// `fetch_low_stock` calls
    pub low_stock: usize,
    /// `fetch_products` calls
    pub products: usize,
    /// `accept_order` calls
    pub accept: usize,
    /// `cancel_order` calls
    pub cancel: usize,
}

impl CallCounts {
    /// Sum over every endpoint
    #[must_use]
    pub const fn total(&self) -> usize {
        self.orders + self.low_stock + self.products + self.accept + self.cancel
    }
}

#[derive(Debug, Default)]
struct Counters {
    orders: AtomicUsize,
    low_stock: AtomicUsize,
    products: AtomicUsize,
    accept: AtomicUsize,
    cancel: AtomicUsize,
}

/// Mock inventory backend for testing
#[derive(Debug, Default)]
pub struct MockBackend {
    orders: Mutex<Vec<Order>>,
    products: Mutex<Vec<Product>>,
    delay: Mutex<Duration>,
    fail_fetches: AtomicBool,
    fail_actions: AtomicBool,
    counters: Counters,
}

impl MockBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the order list
    #[must_use]
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *self.orders.lock() = orders;
        self
    }

    /// Seed the product list
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        *self.products.lock() = products;
        self
    }

    /// Delay every response
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    /// Fail every fetch with a 503
    #[must_use]
    pub fn with_fetch_failure(self) -> Self {
        self.set_fetch_failure(true);
        self
    }

    /// Toggle fetch failures
    pub fn set_fetch_failure(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Toggle accept/cancel failures (500 with an `error` body)
    pub fn set_action_failure(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    /// Change the response delay
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Replace the order list, as if another operator acted
    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock() = orders;
    }

    /// Current order list
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().clone()
    }

    /// Current product list
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.products.lock().clone()
    }

    /// Snapshot of the call counters
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            orders: self.counters.orders.load(Ordering::SeqCst),
            low_stock: self.counters.low_stock.load(Ordering::SeqCst),
            products: self.counters.products.load(Ordering::SeqCst),
            accept: self.counters.accept.load(Ordering::SeqCst),
            cancel: self.counters.cancel.load(Ordering::SeqCst),
        }
    }

    async fn respond(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    fn check_fetch(&self) -> ClientResult<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ClientError::status(503, "Service Unavailable"));
        }
        Ok(())
    }

    fn check_action(&self, what: &str) -> ClientResult<()> {
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(ClientError::status(500, format!("Failed to {what} order")));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryBackend for MockBackend {
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        self.respond(&self.counters.orders).await;
        self.check_fetch()?;
        Ok(self.orders())
    }

    async fn fetch_low_stock(&self) -> ClientResult<Vec<Product>> {
        self.respond(&self.counters.low_stock).await;
        self.check_fetch()?;
        Ok(self
            .products
            .lock()
            .iter()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect())
    }

    async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        self.respond(&self.counters.products).await;
        self.check_fetch()?;
        Ok(self.products())
    }

    async fn accept_order(&self, id: OrderId) -> ClientResult<AcceptOutcome> {
        self.respond(&self.counters.accept).await;
        self.check_action("accept")?;

        let mut orders = self.orders.lock();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ClientError::status(404, "Order not found"))?;
        if order.status != OrderStatus::Pending {
            return Err(ClientError::status(400, "Only pending orders can be accepted"));
        }

        let mut low_stock_alert = None;
        let mut products = self.products.lock();
        if let Some(product) = products.iter_mut().find(|p| p.name == order.item_name) {
            if product.stock_quantity < order.item_quantity {
                return Err(ClientError::status(
                    400,
                    format!(
                        "Insufficient stock. Only {} available.",
                        product.stock_quantity
                    ),
                ));
            }
            product.stock_quantity -= order.item_quantity;
            if product.is_low_stock() {
                low_stock_alert = Some(LowStockAlert {
                    product_id: Some(product.id),
                    product_name: product.name.clone(),
                    remaining_stock: product.stock_quantity,
                    threshold: Some(product.low_stock_threshold),
                });
            }
        }

        order.status = OrderStatus::Processing;
        Ok(AcceptOutcome {
            message: "Order accepted and added to processing queue".to_string(),
            low_stock_alert,
        })
    }

    async fn cancel_order(&self, id: OrderId) -> ClientResult<String> {
        self.respond(&self.counters.cancel).await;
        self.check_action("cancel")?;

        let mut orders = self.orders.lock();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ClientError::status(404, "Order not found"))?;
        if matches!(order.status, OrderStatus::Processed | OrderStatus::Cancelled) {
            return Err(ClientError::status(
                400,
                "Cannot cancel processed or already cancelled orders",
            ));
        }

        order.status = OrderStatus::Cancelled;
        Ok("Order cancelled successfully".to_string())
    }
}
