//! Integration Tests - End-to-end Engine Component Testing
//!
//! Tests the interaction between the admission queue, pipeline, broadcast
//! hub and HTTP adapters with mock and simulated venues.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use futures_util::StreamExt;
use mockall::mock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::broadcast;
use tower::ServiceExt;

use dex_order_engine::adapters::http::{self, AppState};
use dex_order_engine::bootstrap::Engine;
use dex_order_engine::config::{AppConfig, VenueConfig};
use dex_order_engine::domain::order::{
    Order, OrderStatus, OrderTicket, OrderType, OrderUpdate, TradingPair,
};
use dex_order_engine::domain::quote::{Quote, SwapReceipt, is_valid_tx_hash};
use dex_order_engine::ports::venue::VenueClient;

// ---- Mock Definitions ----

mock! {
    pub Venue {}

    #[async_trait::async_trait]
    impl VenueClient for Venue {
        fn id(&self) -> String;

        async fn quote(&self, pair: &TradingPair, amount: Decimal) -> anyhow::Result<Quote>;

        async fn execute(&self, order: &Order, quote: &Quote) -> anyhow::Result<SwapReceipt>;
    }
}

// ---- Helpers ----

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.pipeline.build_delay_ms = 0;
    config.metrics.enabled = false;
    config
}

/// Mock venue quoting a fixed price and executing at the quoted price.
fn quoting_venue(id: &'static str, price: f64) -> MockVenue {
    let mut venue = MockVenue::new();
    venue.expect_id().return_const(id.to_string());
    venue
        .expect_quote()
        .returning(move |_, _| Ok(Quote::new(id, price, 0.003)));
    venue.expect_execute().returning(move |_, quote| {
        Ok(SwapReceipt {
            tx_hash: "ab".repeat(32),
            executed_price: quote.price,
            venue: id.to_string(),
        })
    });
    venue
}

fn ticket() -> OrderTicket {
    OrderTicket::new("SOL", "USDC", dec!(1.5), OrderType::Market).unwrap()
}

/// Collect updates until `n` orders reached a terminal status.
async fn collect_until_terminal(
    rx: &mut broadcast::Receiver<OrderUpdate>,
    n: usize,
) -> Vec<OrderUpdate> {
    let mut updates = Vec::new();
    let mut terminal = 0;
    while terminal < n {
        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("engine stalled")
            .expect("hub closed");
        if update.status.is_terminal() {
            terminal += 1;
        }
        updates.push(update);
    }
    updates
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_best_venue_selected_and_executed() {
    let a = quoting_venue("venue_a", 105.0);
    let mut b = MockVenue::new();
    b.expect_id().return_const("venue_b".to_string());
    b.expect_quote()
        .times(1)
        .returning(|_, _| Ok(Quote::new("venue_b", 98.0, 0.002)));
    b.expect_execute().times(0);

    let engine = Engine::with_venues(&test_config(), vec![Arc::new(a), Arc::new(b)]);
    let mut rx = engine.hub.subscribe();
    let order = engine.queue.submit(ticket());
    assert_eq!(order.status(), OrderStatus::Pending);

    let updates = collect_until_terminal(&mut rx, 1).await;
    let statuses: Vec<_> = updates.iter().map(|u| u.status).collect();
    assert_eq!(
        statuses,
        [
            OrderStatus::Routing,
            OrderStatus::Building,
            OrderStatus::Submitted,
            OrderStatus::Confirmed,
        ]
    );

    let confirmed = updates.last().unwrap();
    assert_eq!(confirmed.order_id, order.id);
    assert_eq!(confirmed.selected_venue.as_deref(), Some("venue_a"));
    assert_eq!(confirmed.executed_price, Some(105.0));
    assert!(is_valid_tx_hash(confirmed.tx_hash.as_deref().unwrap()));

    let stored = engine.store.get(&order.id).unwrap();
    assert_eq!(stored.status(), OrderStatus::Confirmed);
    assert_eq!(stored.selected_quote().unwrap().venue, "venue_a");
}

#[tokio::test]
async fn test_venue_failure_fails_order_under_strict_policy() {
    let a = quoting_venue("venue_a", 105.0);
    let mut b = MockVenue::new();
    b.expect_id().return_const("venue_b".to_string());
    b.expect_quote()
        .returning(|_, _| Err(anyhow::anyhow!("pool not found")));
    b.expect_execute().times(0);

    let engine = Engine::with_venues(&test_config(), vec![Arc::new(a), Arc::new(b)]);
    let mut rx = engine.hub.subscribe();
    let order = engine.queue.submit(ticket());

    let updates = collect_until_terminal(&mut rx, 1).await;
    let failed = updates.last().unwrap();
    assert_eq!(failed.order_id, order.id);
    assert_eq!(failed.status, OrderStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("venue_b"));
    assert!(failed.tx_hash.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifteen_orders_respect_ceiling_of_ten() {
    let mut config = test_config();
    config.queue.max_concurrent = 10;
    config.venues = vec![
        VenueConfig {
            execute_latency_min_ms: 20,
            execute_latency_max_ms: 40,
            ..VenueConfig::fixed("raydium", 100.0, 0.003)
        },
        VenueConfig {
            execute_latency_min_ms: 20,
            execute_latency_max_ms: 40,
            ..VenueConfig::fixed("meteora", 101.0, 0.002)
        },
    ];
    let engine = Engine::build(&config);
    let mut rx = engine.hub.subscribe();

    let ids: Vec<_> = (0..15).map(|_| engine.queue.submit(ticket()).id).collect();
    assert!(engine.store.active_count() <= 10);

    let mut terminal = 0;
    while terminal < 15 {
        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("engine stalled")
            .expect("hub closed");
        assert!(engine.store.active_count() <= 10);
        assert!(engine.queue.in_flight() <= 10);
        if update.status.is_terminal() {
            terminal += 1;
        }
    }

    for id in ids {
        let order = engine.store.get(&id).unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.selected_quote().unwrap().venue, "meteora");
    }
}

#[tokio::test]
async fn test_missing_amount_rejected_without_broadcast() {
    let engine = Engine::build(&test_config());
    let mut observer = engine.hub.subscribe();
    let app = http::router(AppState {
        queue: Arc::clone(&engine.queue),
        hub: Arc::clone(&engine.hub),
        metrics: None,
    });

    let request = Request::post("/api/orders/execute")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"tokenIn":"SOL","tokenOut":"USDC"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("amount"));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(engine.store.is_empty());
    assert!(observer.try_recv().is_err());
}

#[tokio::test]
async fn test_late_observer_gets_no_replay() {
    let engine = Engine::with_venues(
        &test_config(),
        vec![Arc::new(quoting_venue("venue_a", 100.0))],
    );
    let mut early = engine.hub.subscribe();
    for _ in 0..3 {
        engine.queue.submit(ticket());
    }
    collect_until_terminal(&mut early, 3).await;

    let mut late = engine.hub.subscribe();
    assert!(late.try_recv().is_err());

    let next = engine.queue.submit(ticket());
    let first = tokio::time::timeout(Duration::from_secs(5), late.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.order_id, next.id);
    assert_eq!(first.status, OrderStatus::Routing);
}

#[tokio::test]
async fn test_status_stream_over_websocket() {
    let engine = Engine::with_venues(
        &test_config(),
        vec![Arc::new(quoting_venue("venue_a", 103.5))],
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let state = AppState {
        queue: Arc::clone(&engine.queue),
        hub: Arc::clone(&engine.hub),
        metrics: None,
    };
    let server = tokio::spawn(http::serve(listener, state, shutdown_rx));

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    let order = engine.queue.submit(ticket());

    let mut statuses = Vec::new();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("stream stalled")
            .unwrap()
            .unwrap();
        let tokio_tungstenite::tungstenite::Message::Text(text) = frame else {
            continue;
        };
        let update: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(update["orderId"], order.id.to_string());
        let status = update["status"].as_str().unwrap().to_string();
        if status == "confirmed" {
            assert_eq!(update["selectedDex"], "venue_a");
            assert_eq!(update["executedPrice"], 103.5);
            assert_eq!(update["txHash"].as_str().unwrap().len(), 64);
        }
        statuses.push(status);
        if statuses.last().is_some_and(|s| s == "confirmed" || s == "failed") {
            break;
        }
    }
    assert_eq!(statuses, ["routing", "building", "submitted", "confirmed"]);

    socket.close(None).await.unwrap();
    shutdown_tx.send(()).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not shut down");
    stopped.unwrap().unwrap();
}
