//! Dashboard service behavior against the in-memory backend

use chrono::Utc;
use labdash_client::MockBackend;
use labdash_core::{
    Category, Config, LiveEvent, LowStockAlert, Order, OrderId, OrderStatus, OrderTab,
    OrderUpdate, Product,
};
use labdash_dashboard::{
    CancelOutcome, DashboardError, DashboardService, FixedAnswer, MemorySessionStore, Navigator,
    ServiceStatus, SessionContext, SessionStore, logout,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn order(id: OrderId, item: &str, qty: u32, status: OrderStatus) -> Order {
    Order {
        id,
        username: Some("student1".to_string()),
        item_name: item.to_string(),
        item_quantity: qty,
        status,
        created_on: Utc::now(),
    }
}

fn beaker(stock: u32) -> Product {
    Product {
        id: 3,
        name: "Beaker 500ml".to_string(),
        category: Category::Glassware,
        stock_quantity: stock,
        low_stock_threshold: 10,
        price: None,
        description: None,
    }
}

fn dashboard(backend: &Arc<MockBackend>) -> DashboardService {
    DashboardService::new(&Config::default(), backend.clone())
}

/// Let spawned tasks run; auto-advances paused time
async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

#[derive(Debug, Default)]
struct RecordingNavigator {
    redirected: AtomicBool,
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirected.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_initial_load_partitions_orders() {
    let backend = Arc::new(MockBackend::new().with_orders(vec![
        order(1, "Beaker 500ml", 1, OrderStatus::Pending),
        order(2, "Beaker 500ml", 1, OrderStatus::Processing),
        order(3, "Beaker 500ml", 2, OrderStatus::Processed),
        order(4, "Nitrile Gloves", 1, OrderStatus::Cancelled),
    ]));
    let service = dashboard(&backend);
    let (_events_tx, events_rx) = mpsc::channel(8);

    service.start_with_events(events_rx).await.unwrap();
    let view = service.snapshot();

    let ids = |tab| view.orders.get(tab).iter().map(|o| o.id).collect::<Vec<_>>();
    assert_eq!(ids(OrderTab::Pending), vec![1]);
    assert_eq!(ids(OrderTab::Processing), vec![2]);
    assert_eq!(ids(OrderTab::Completed), vec![3, 4]);
    assert_eq!(view.sales.len(), 1);
    assert_eq!(view.sales[0].value, 2);
    assert_eq!(service.status(), ServiceStatus::Running);

    let calls = backend.calls();
    assert_eq!((calls.orders, calls.low_stock, calls.products), (1, 1, 1));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_lists() {
    let backend = Arc::new(
        MockBackend::new()
            .with_orders(vec![order(1, "Beaker 500ml", 1, OrderStatus::Pending)])
            .with_products(vec![beaker(4)]),
    );
    let service = dashboard(&backend);

    service.refresh_all().await;
    let before = service.snapshot();
    assert_eq!(before.error, None);

    backend.set_fetch_failure(true);
    service.refresh_all().await;
    let after = service.snapshot();

    assert_eq!(after.orders, before.orders);
    assert_eq!(after.products, before.products);
    assert_eq!(after.low_stock, before.low_stock);
    assert!(after.error.unwrap().starts_with("Failed to fetch"));
}

#[tokio::test]
async fn test_accept_moves_order_out_of_pending() {
    let backend = Arc::new(
        MockBackend::new()
            .with_orders(vec![order(7, "Beaker 500ml", 1, OrderStatus::Pending)])
            .with_products(vec![beaker(50)]),
    );
    let service = dashboard(&backend);
    service.refresh_all().await;

    let outcome = service.accept_order(7).await.unwrap();
    let view = service.snapshot();

    assert_eq!(outcome.low_stock_alert, None);
    assert!(!view.orders.contains(OrderTab::Pending, 7));
    assert!(view.orders.contains(OrderTab::Processing, 7));
    assert_eq!(view.success.as_deref(), Some("Order #7 accepted successfully"));
    assert_eq!(view.error, None);
    assert_eq!(view.products[0].stock_quantity, 49);
}

#[tokio::test]
async fn test_accept_with_low_stock_alert_shows_banner() {
    let backend = Arc::new(
        MockBackend::new()
            .with_orders(vec![order(7, "Beaker 500ml", 10, OrderStatus::Pending)])
            .with_products(vec![beaker(12)]),
    );
    let service = dashboard(&backend);

    service.accept_order(7).await.unwrap();
    let view = service.snapshot();

    assert_eq!(
        view.error.as_deref(),
        Some("⚠️ Low Stock Alert: Beaker 500ml has only 2 left!")
    );
    assert_eq!(view.success.as_deref(), Some("Order #7 accepted successfully"));
    assert_eq!(view.low_stock.len(), 1);
}

#[tokio::test]
async fn test_accept_rejection_shows_backend_message() {
    let backend = Arc::new(
        MockBackend::new().with_orders(vec![order(5, "Beaker 500ml", 1, OrderStatus::Processing)]),
    );
    let service = dashboard(&backend);

    let err = service.accept_order(5).await.unwrap_err();

    assert!(matches!(err, DashboardError::Client(_)));
    let view = service.snapshot();
    assert_eq!(
        view.error.as_deref(),
        Some("Failed to accept order: Only pending orders can be accepted")
    );
    assert_eq!(view.success, None);
    assert_eq!(backend.calls().orders, 0);
}

#[tokio::test]
async fn test_cancel_declined_sends_nothing() {
    let backend = Arc::new(
        MockBackend::new().with_orders(vec![order(3, "Beaker 500ml", 1, OrderStatus::Pending)]),
    );
    let service = dashboard(&backend);
    service.refresh_all().await;
    let calls = backend.calls();
    let before = service.snapshot();

    let outcome = service.cancel_order(3, &FixedAnswer(false)).await.unwrap();

    assert_eq!(outcome, CancelOutcome::Declined);
    assert_eq!(backend.calls(), calls);
    assert_eq!(service.snapshot(), before);
    assert_eq!(backend.orders()[0].status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_cancel_confirmed_refreshes_orders_only() {
    let backend = Arc::new(
        MockBackend::new().with_orders(vec![order(3, "Beaker 500ml", 1, OrderStatus::Pending)]),
    );
    let service = dashboard(&backend);
    service.refresh_all().await;
    let before = backend.calls();

    let outcome = service.cancel_order(3, &FixedAnswer(true)).await.unwrap();

    assert_eq!(
        outcome,
        CancelOutcome::Cancelled {
            message: "Order cancelled successfully".to_string()
        }
    );
    let after = backend.calls();
    assert_eq!(after.cancel, 1);
    assert_eq!(after.orders, before.orders + 1);
    assert_eq!(after.low_stock, before.low_stock);
    assert_eq!(after.products, before.products);

    let view = service.snapshot();
    assert!(view.orders.contains(OrderTab::Completed, 3));
    assert_eq!(view.success.as_deref(), Some("Order #3 cancelled successfully"));
}

#[tokio::test]
async fn test_cancel_rejection_shows_backend_message() {
    let backend = Arc::new(
        MockBackend::new().with_orders(vec![order(3, "Beaker 500ml", 1, OrderStatus::Processed)]),
    );
    let service = dashboard(&backend);

    assert!(service.cancel_order(3, &FixedAnswer(true)).await.is_err());
    assert_eq!(
        service.snapshot().error.as_deref(),
        Some("Failed to cancel order: Cannot cancel processed or already cancelled orders")
    );
}

#[tokio::test(start_paused = true)]
async fn test_low_stock_event_refreshes_stock_lists() {
    let backend = Arc::new(MockBackend::new().with_products(vec![beaker(2)]));
    let service = dashboard(&backend);
    let (events_tx, events_rx) = mpsc::channel(8);
    service.start_with_events(events_rx).await.unwrap();

    events_tx
        .send(LiveEvent::LowStockAlert(LowStockAlert::new("Beaker 500ml", 2)))
        .await
        .unwrap();
    settle().await;

    let error = service.snapshot().error.unwrap();
    assert!(error.contains("Beaker 500ml"));
    assert!(error.contains('2'));

    let calls = backend.calls();
    assert_eq!((calls.orders, calls.low_stock, calls.products), (1, 2, 2));

    service.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_order_update_event_refreshes_everything() {
    let backend = Arc::new(MockBackend::new());
    let service = dashboard(&backend);
    let (events_tx, events_rx) = mpsc::channel(8);
    service.start_with_events(events_rx).await.unwrap();

    backend.set_orders(vec![order(9, "Beaker 500ml", 1, OrderStatus::Pending)]);
    events_tx
        .send(LiveEvent::OrderUpdate(OrderUpdate {
            order_id: Some(9),
            action: Some("new_order".to_string()),
            status: Some("Pending".to_string()),
        }))
        .await
        .unwrap();
    settle().await;

    let calls = backend.calls();
    assert_eq!((calls.orders, calls.low_stock, calls.products), (2, 2, 2));
    assert!(service.snapshot().orders.contains(OrderTab::Pending, 9));

    service.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_response_after_teardown_is_discarded() {
    let backend = Arc::new(
        MockBackend::new()
            .with_orders(vec![order(1, "Beaker 500ml", 1, OrderStatus::Pending)])
            .with_delay(Duration::from_secs(5)),
    );
    let service = dashboard(&backend);

    tokio::join!(service.refresh_all(), async {
        sleep(Duration::from_secs(1)).await;
        service.stop().await.unwrap();
    });

    let view = service.snapshot();
    assert_eq!(backend.calls().orders, 1);
    assert!(view.orders.is_empty());
    assert_eq!(view.error, None);
    assert_eq!(service.status(), ServiceStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_success_message_clears_after_three_seconds() {
    let backend = Arc::new(MockBackend::new().with_orders(vec![
        order(1, "Beaker 500ml", 1, OrderStatus::Pending),
        order(2, "Beaker 500ml", 1, OrderStatus::Pending),
    ]));
    let service = dashboard(&backend);

    service.accept_order(1).await.unwrap();
    sleep(Duration::from_secs(2)).await;
    service.cancel_order(2, &FixedAnswer(true)).await.unwrap();

    // The first message's timer fires here but a newer message is showing
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(
        service.snapshot().success.as_deref(),
        Some("Order #2 cancelled successfully")
    );

    sleep(Duration::from_secs(2)).await;
    assert_eq!(service.snapshot().success, None);
}

#[tokio::test(start_paused = true)]
async fn test_polls_every_ten_seconds_until_stopped() {
    let backend = Arc::new(MockBackend::new());
    let service = dashboard(&backend);
    let (_events_tx, events_rx) = mpsc::channel(8);
    service.start_with_events(events_rx).await.unwrap();
    assert_eq!(backend.calls().orders, 1);

    sleep(Duration::from_millis(9_500)).await;
    assert_eq!(backend.calls().orders, 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.calls().orders, 2);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.calls().orders, 3);

    service.stop().await.unwrap();
    sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.calls().orders, 3);
}

#[tokio::test]
async fn test_lifecycle_errors() {
    let backend = Arc::new(MockBackend::new());
    let service = dashboard(&backend);
    let (_first_tx, first_rx) = mpsc::channel(8);
    let (_second_tx, second_rx) = mpsc::channel(8);
    let (_third_tx, third_rx) = mpsc::channel(8);

    service.start_with_events(first_rx).await.unwrap();
    assert!(matches!(
        service.start_with_events(second_rx).await,
        Err(DashboardError::AlreadyRunning)
    ));

    service.stop().await.unwrap();
    service.stop().await.unwrap();
    assert_eq!(service.status(), ServiceStatus::Stopped);

    assert!(matches!(
        service.start_with_events(third_rx).await,
        Err(DashboardError::TornDown)
    ));
}

/// Push channel pointed at a port nothing listens on
fn unreachable_live_config() -> Config {
    let mut config = Config::default();
    config.live.ws_url = "ws://127.0.0.1:9".to_string();
    config.live.reconnect = false;
    config
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_initial_load_closes_push_channel() {
    let backend = Arc::new(MockBackend::new().with_delay(Duration::from_secs(5)));
    let service = DashboardService::new(&unreachable_live_config(), backend.clone());

    let (started, stopped) = tokio::join!(service.start(), async {
        sleep(Duration::from_secs(1)).await;
        service.stop().await
    });
    started.unwrap();
    stopped.unwrap();

    assert_eq!(service.status(), ServiceStatus::Stopped);
    assert_eq!(service.connection_state(), None);
}

#[tokio::test]
async fn test_start_after_stop_opens_no_push_channel() {
    let backend = Arc::new(MockBackend::new());
    let service = DashboardService::new(&unreachable_live_config(), backend.clone());

    service.stop().await.unwrap();
    assert!(matches!(service.start().await, Err(DashboardError::TornDown)));

    assert_eq!(service.connection_state(), None);
    assert_eq!(backend.calls().orders, 0);
}

#[tokio::test]
async fn test_logout_tears_down_clears_session_and_redirects() {
    let backend = Arc::new(MockBackend::new());
    let service = dashboard(&backend);
    let (_events_tx, events_rx) = mpsc::channel(8);
    service.start_with_events(events_rx).await.unwrap();

    let store = MemorySessionStore::with_session(
        SessionContext::new("jwt-abc", "admin").admin(true),
    );
    let navigator = RecordingNavigator::default();

    logout(Some(&service), &store, &navigator).await.unwrap();

    assert_eq!(service.status(), ServiceStatus::Stopped);
    assert_eq!(store.load().unwrap(), None);
    assert!(navigator.redirected.load(Ordering::SeqCst));

    backend.set_orders(vec![order(1, "Beaker 500ml", 1, OrderStatus::Pending)]);
    service.refresh_all().await;
    assert!(service.snapshot().orders.is_empty());
}
