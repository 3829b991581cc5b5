//! Dashboard service
//!
//! Owns the view state and everything that writes to it: the initial load,
//! the poll task, the live event task and the accept/cancel actions. All
//! writes go through one path that checks a `live` flag under the same lock
//! teardown clears it with, so a response that lands after [`stop`] changes
//! nothing.
//!
//! [`stop`]: DashboardService::stop

use crate::confirm::Confirmation;
use crate::error::{DashboardError, Result};
use crate::state::ViewState;
use futures_util::future::join_all;
use labdash_client::{AcceptOutcome, ClientError, ConnectionState, InventoryBackend, LiveListener};
use labdash_core::config::{Config, DashboardConfig, LiveConfig};
use labdash_core::inventory::{CategoryFilter, SortKey, StockFilter};
use labdash_core::{LiveEvent, OrderId, OrderTab};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

/// Task handles type alias
type TaskHandles = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Live events buffered between the listener and the event task
const EVENT_BUFFER: usize = 64;

/// Banner shown when the order list cannot be fetched
pub const FETCH_ORDERS_FAILED: &str = "Failed to fetch orders";

/// Banner shown when the low stock list cannot be fetched
pub const FETCH_LOW_STOCK_FAILED: &str = "Failed to fetch low stock products";

/// Banner shown when the product list cannot be fetched
pub const FETCH_PRODUCTS_FAILED: &str = "Failed to fetch products";

/// Service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    /// Created, not started
    #[default]
    Idle,
    /// Initial load in progress
    Starting,
    /// Polling and listening
    Running,
    /// Teardown in progress
    Stopping,
    /// Torn down; terminal
    Stopped,
}

/// Which lists a refresh re-fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshScope {
    /// Re-fetch orders
    pub orders: bool,
    /// Re-fetch the low stock list
    pub low_stock: bool,
    /// Re-fetch all products
    pub products: bool,
}

impl RefreshScope {
    /// Everything; initial load, poll ticks, `order_update`, accept
    pub const ALL: Self = Self {
        orders: true,
        low_stock: true,
        products: true,
    };

    /// Orders only; cancel
    pub const ORDERS: Self = Self {
        orders: true,
        low_stock: false,
        products: false,
    };

    /// Stock lists only; `low_stock_alert`
    pub const STOCK: Self = Self {
        orders: false,
        low_stock: true,
        products: true,
    };
}

/// Result of a cancel request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The operator said no; nothing was sent
    Declined,
    /// The backend cancelled the order
    Cancelled {
        /// Confirmation text from the backend
        message: String,
    },
}

/// Prompt shown before cancelling `id`
#[must_use]
pub fn cancel_prompt(id: OrderId) -> String {
    format!("Are you sure you want to cancel order #{id}?")
}

fn action_failure_message(verb: &str, gerund: &str, err: &ClientError) -> String {
    err.backend_message().map_or_else(
        || format!("An error occurred while {gerund} the order"),
        |message| format!("Failed to {verb} order: {message}"),
    )
}

struct Guarded {
    live: bool,
    success_generation: u64,
    view: ViewState,
}

/// The single write path into the view
#[derive(Clone)]
struct Store {
    guarded: Arc<RwLock<Guarded>>,
    version: Arc<watch::Sender<u64>>,
}

impl Store {
    fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            guarded: Arc::new(RwLock::new(Guarded {
                live: true,
                success_generation: 0,
                view: ViewState::default(),
            })),
            version: Arc::new(version),
        }
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    /// Apply `update` unless the view has been torn down
    fn commit<F: FnOnce(&mut ViewState)>(&self, update: F) -> bool {
        let mut guarded = self.guarded.write();
        if !guarded.live {
            debug!("Discarding update after teardown");
            return false;
        }
        update(&mut guarded.view);
        drop(guarded);
        self.notify();
        true
    }

    fn show_success(&self, message: String) -> Option<u64> {
        let mut guarded = self.guarded.write();
        if !guarded.live {
            return None;
        }
        guarded.success_generation += 1;
        guarded.view.set_success(message);
        let generation = guarded.success_generation;
        drop(guarded);
        self.notify();
        Some(generation)
    }

    /// Clear the success banner if no newer one replaced it
    fn expire_success(&self, generation: u64) {
        let mut guarded = self.guarded.write();
        if guarded.live && guarded.success_generation == generation {
            guarded.view.dismiss_success();
            drop(guarded);
            self.notify();
        }
    }

    fn teardown(&self) {
        self.guarded.write().live = false;
    }

    fn snapshot(&self) -> ViewState {
        self.guarded.read().view.clone()
    }
}

/// Fetches lists and applies live events; shared with background tasks
#[derive(Clone)]
struct Fetcher {
    backend: Arc<dyn InventoryBackend>,
    store: Store,
}

impl Fetcher {
    async fn refresh(&self, scope: RefreshScope) {
        tokio::join!(
            async {
                if scope.orders {
                    self.refresh_orders().await;
                }
            },
            async {
                if scope.low_stock {
                    self.refresh_low_stock().await;
                }
            },
            async {
                if scope.products {
                    self.refresh_products().await;
                }
            },
        );
    }

    async fn refresh_orders(&self) {
        match self.backend.fetch_orders().await {
            Ok(orders) => {
                let count = orders.len();
                if self.store.commit(|view| view.set_orders(orders)) {
                    debug!(count, "Orders refreshed");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch orders");
                self.store.commit(|view| view.set_error(FETCH_ORDERS_FAILED));
            }
        }
    }

    async fn refresh_low_stock(&self) {
        match self.backend.fetch_low_stock().await {
            Ok(products) => {
                let count = products.len();
                if self.store.commit(|view| view.set_low_stock(products)) {
                    debug!(count, "Low stock list refreshed");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch low stock products");
                self.store
                    .commit(|view| view.set_error(FETCH_LOW_STOCK_FAILED));
            }
        }
    }

    async fn refresh_products(&self) {
        match self.backend.fetch_products().await {
            Ok(products) => {
                let count = products.len();
                if self.store.commit(|view| view.set_products(products)) {
                    debug!(count, "Products refreshed");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch products");
                self.store.commit(|view| view.set_error(FETCH_PRODUCTS_FAILED));
            }
        }
    }

    async fn handle_event(&self, event: LiveEvent) {
        match event {
            LiveEvent::OrderUpdate(update) => {
                info!(
                    order_id = ?update.order_id,
                    action = ?update.action,
                    status = ?update.status,
                    "Order update received"
                );
                self.refresh(RefreshScope::ALL).await;
            }
            LiveEvent::LowStockAlert(alert) => {
                warn!(
                    product = %alert.product_name,
                    remaining = alert.remaining_stock,
                    "Low stock alert received"
                );
                let banner = alert.banner();
                self.store.commit(|view| view.set_error(banner));
                self.refresh(RefreshScope::STOCK).await;
            }
        }
    }
}

/// Admin dashboard service
pub struct DashboardService {
    /// Timing configuration
    settings: DashboardConfig,

    /// Push channel configuration
    live: LiveConfig,

    /// Backend access and view store
    fetcher: Fetcher,

    /// Service status
    status: Arc<RwLock<ServiceStatus>>,

    /// Running task handles
    task_handles: TaskHandles,

    /// Shutdown sender (for broadcasting shutdown)
    shutdown_tx: broadcast::Sender<()>,

    /// Push channel, when started with one
    listener: Mutex<Option<LiveListener>>,
}

impl fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardService")
            .field("settings", &self.settings)
            .field("live", &self.live)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl DashboardService {
    /// Create a dashboard over `backend`
    ///
    /// The view accepts writes from creation until [`stop`](Self::stop), so
    /// one-shot refreshes and actions work without starting background tasks.
    #[must_use]
    pub fn new(config: &Config, backend: Arc<dyn InventoryBackend>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            settings: config.dashboard.clone(),
            live: config.live.clone(),
            fetcher: Fetcher {
                backend,
                store: Store::new(),
            },
            status: Arc::new(RwLock::new(ServiceStatus::Idle)),
            task_handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_tx,
            listener: Mutex::new(None),
        }
    }

    /// Current service status
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        *self.status.read()
    }

    /// Copy of the current view
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.fetcher.store.snapshot()
    }

    /// Receiver that changes whenever the view does
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.fetcher.store.version.subscribe()
    }

    /// Push channel state, when the dashboard owns a listener
    #[must_use]
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.listener.lock().as_ref().map(LiveListener::state)
    }

    /// Move `Idle -> Starting`, running `install` under the status lock so a
    /// concurrent `stop()` sees everything it sets up
    fn begin_start(&self, install: impl FnOnce()) -> Result<()> {
        let mut status = self.status.write();
        match *status {
            ServiceStatus::Idle => {
                install();
                *status = ServiceStatus::Starting;
                Ok(())
            }
            ServiceStatus::Starting | ServiceStatus::Running => Err(DashboardError::AlreadyRunning),
            ServiceStatus::Stopping | ServiceStatus::Stopped => Err(DashboardError::TornDown),
        }
    }

    /// Load everything, open the push channel and start polling
    ///
    /// # Errors
    ///
    /// Returns an error if the dashboard is running or has been torn down.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        self.begin_start(|| {
            *self.listener.lock() = Some(LiveListener::spawn(&self.live, events_tx));
        })?;

        self.launch(events_rx).await;
        Ok(())
    }

    /// Like [`start`](Self::start), with live events from `events` instead of
    /// a WebSocket
    ///
    /// # Errors
    ///
    /// Returns an error if the dashboard is running or has been torn down.
    #[instrument(skip(self, events))]
    pub async fn start_with_events(&self, events: mpsc::Receiver<LiveEvent>) -> Result<()> {
        self.begin_start(|| {})?;
        self.launch(events).await;
        Ok(())
    }

    async fn launch(&self, events: mpsc::Receiver<LiveEvent>) {
        info!("Starting dashboard");
        self.fetcher.refresh(RefreshScope::ALL).await;

        // stop() may have run during the initial load
        let mut status = self.status.write();
        if *status != ServiceStatus::Starting {
            debug!("Dashboard stopped during initial load");
            return;
        }

        let mut handles = self.task_handles.lock();
        handles.push(self.spawn_event_handler(events));
        handles.push(self.spawn_poll_task());
        drop(handles);

        *status = ServiceStatus::Running;
        drop(status);

        info!(
            poll_interval_seconds = self.settings.poll_interval_seconds,
            "Dashboard started"
        );
    }

    /// Tear down: stop accepting writes, close the push channel, stop tasks
    ///
    /// Idempotent. The view stays readable afterwards.
    ///
    /// # Errors
    ///
    /// Currently always succeeds.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        {
            let mut status = self.status.write();
            if matches!(*status, ServiceStatus::Stopping | ServiceStatus::Stopped) {
                debug!("Dashboard already stopped");
                return Ok(());
            }
            *status = ServiceStatus::Stopping;
        }

        info!("Stopping dashboard");
        self.fetcher.store.teardown();

        // No receivers when the dashboard was never started
        let _ = self.shutdown_tx.send(());

        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.close().await;
        }

        let handles: Vec<_> = self.task_handles.lock().drain(..).collect();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        if timeout(self.settings.shutdown_timeout(), join_all(handles))
            .await
            .is_err()
        {
            warn!("Dashboard shutdown timed out, aborting remaining tasks");
            for abort in aborts {
                abort.abort();
            }
        }

        *self.status.write() = ServiceStatus::Stopped;
        info!("Dashboard stopped");
        Ok(())
    }

    fn spawn_poll_task(&self) -> JoinHandle<()> {
        let fetcher = self.fetcher.clone();
        let period = self.settings.poll_interval();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        debug!("Poll tick");
                        fetcher.refresh(RefreshScope::ALL).await;
                    }
                }
            }

            debug!("Poll task stopped");
        })
    }

    fn spawn_event_handler(&self, mut events: mpsc::Receiver<LiveEvent>) -> JoinHandle<()> {
        let fetcher = self.fetcher.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    event = events.recv() => match event {
                        Some(event) => fetcher.handle_event(event).await,
                        None => {
                            debug!("Live event source closed");
                            break;
                        }
                    },
                }
            }

            debug!("Event task stopped");
        })
    }

    fn show_success(&self, message: String) {
        let Some(generation) = self.fetcher.store.show_success(message) else {
            return;
        };

        let store = self.fetcher.store.clone();
        let ttl = self.settings.success_message_ttl();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = sleep(ttl) => store.expire_success(generation),
                _ = shutdown_rx.recv() => {}
            }
        });

        let mut handles = self.task_handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Re-fetch orders, low stock and products concurrently
    pub async fn refresh_all(&self) {
        self.fetcher.refresh(RefreshScope::ALL).await;
    }

    /// Re-fetch the lists in `scope` concurrently
    pub async fn refresh(&self, scope: RefreshScope) {
        self.fetcher.refresh(scope).await;
    }

    /// Apply one live event as if it came from the push channel
    pub async fn handle_event(&self, event: LiveEvent) {
        self.fetcher.handle_event(event).await;
    }

    /// Accept a pending order, then re-fetch everything
    ///
    /// # Errors
    ///
    /// Returns the backend error after showing it in the error banner.
    #[instrument(skip(self))]
    pub async fn accept_order(&self, id: OrderId) -> Result<AcceptOutcome> {
        match self.fetcher.backend.accept_order(id).await {
            Ok(outcome) => {
                info!(order_id = id, "Order accepted");
                self.show_success(format!("Order #{id} accepted successfully"));

                if let Some(ref alert) = outcome.low_stock_alert {
                    warn!(
                        product = %alert.product_name,
                        remaining = alert.remaining_stock,
                        "Accepted order left product low on stock"
                    );
                    let banner = alert.banner();
                    self.fetcher.store.commit(|view| view.set_error(banner));
                }

                self.fetcher.refresh(RefreshScope::ALL).await;
                Ok(outcome)
            }
            Err(e) => {
                error!(order_id = id, error = %e, "Failed to accept order");
                let message = action_failure_message("accept", "accepting", &e);
                self.fetcher.store.commit(|view| view.set_error(message));
                Err(e.into())
            }
        }
    }

    /// Cancel an order after the operator confirms
    ///
    /// Declining sends nothing and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns the backend error after showing it in the error banner.
    #[instrument(skip(self, confirmation))]
    pub async fn cancel_order(
        &self,
        id: OrderId,
        confirmation: &dyn Confirmation,
    ) -> Result<CancelOutcome> {
        if !confirmation.confirm(&cancel_prompt(id)).await {
            info!(order_id = id, "Cancellation declined");
            return Ok(CancelOutcome::Declined);
        }

        match self.fetcher.backend.cancel_order(id).await {
            Ok(message) => {
                info!(order_id = id, "Order cancelled");
                self.show_success(format!("Order #{id} cancelled successfully"));
                self.fetcher.refresh(RefreshScope::ORDERS).await;
                Ok(CancelOutcome::Cancelled { message })
            }
            Err(e) => {
                error!(order_id = id, error = %e, "Failed to cancel order");
                let message = action_failure_message("cancel", "canceling", &e);
                self.fetcher.store.commit(|view| view.set_error(message));
                Err(e.into())
            }
        }
    }

    /// Switch the visible order tab
    pub fn select_tab(&self, tab: OrderTab) {
        self.fetcher.store.commit(|view| view.select_tab(tab));
    }

    /// Restrict the inventory table to a category
    pub fn set_category_filter(&self, filter: CategoryFilter) {
        self.fetcher
            .store
            .commit(|view| view.set_category_filter(filter));
    }

    /// Restrict the inventory table to a stock level
    pub fn set_stock_filter(&self, filter: StockFilter) {
        self.fetcher.store.commit(|view| view.set_stock_filter(filter));
    }

    /// Change the inventory sort order
    pub fn set_sort(&self, sort: SortKey) {
        self.fetcher.store.commit(|view| view.set_sort(sort));
    }

    /// Expand or collapse the low stock panel
    pub fn toggle_low_stock_panel(&self) {
        self.fetcher.store.commit(ViewState::toggle_low_stock_panel);
    }

    /// Hide the error banner
    pub fn dismiss_error(&self) {
        self.fetcher.store.commit(ViewState::dismiss_error);
    }

    /// Hide the success banner
    pub fn dismiss_success(&self) {
        self.fetcher.store.commit(ViewState::dismiss_success);
    }
}
