//! HTTP Adapters - Order API and Status Stream
//!
//! axum 0.7 router exposing:
//! - `POST /api/orders/execute`: submit an order
//! - `GET /api/orders/:id`: current snapshot of one order
//! - `GET /ws`: WebSocket stream of order updates
//! - `GET /health`: liveness
//!
//! Every route accepts cross-origin requests; the request origin is
//! echoed back so browser clients on any host can submit orders.

pub mod handlers;
pub mod types;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::adapters::broadcast::BroadcastHub;
use crate::adapters::metrics::MetricsRegistry;
use crate::usecases::admission_queue::AdmissionQueue;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<AdmissionQueue>,
    pub hub: Arc<BroadcastHub>,
    pub metrics: Option<Arc<MetricsRegistry>>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/orders/execute", post(handlers::submit_order))
        .route("/api/orders/:id", get(handlers::get_order))
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(handlers::health))
        .layer(cors())
        .with_state(state)
}

/// Allow any origin by mirroring it, with any method and header.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Serve the API on an already-bound listener until shutdown.
///
/// # Errors
/// Returns error if the server fails while accepting connections.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let address = listener.local_addr()?;
    info!(address = %address, "Order API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("Order API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, VenueConfig};
    use crate::bootstrap::Engine;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn state() -> AppState {
        let mut config = AppConfig::default();
        config.venues = vec![VenueConfig::fixed("raydium", 100.0, 0.003)];
        config.pipeline.build_delay_ms = 0;
        let engine = Engine::build(&config);
        AppState {
            queue: engine.queue,
            hub: engine.hub,
            metrics: None,
        }
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(body: &Value) -> Request<Body> {
        Request::post("/api/orders/execute")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_returns_pending() {
        let state = state();
        let (status, body) = call(
            router(state.clone()),
            post_json(&json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": 1.5})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        let id: uuid::Uuid = body["orderId"].as_str().unwrap().parse().unwrap();
        assert!(state.queue.store().get(&id).is_some());
    }

    #[tokio::test]
    async fn test_missing_amount_is_bad_request() {
        let state = state();
        let mut observer = state.hub.subscribe();
        let (status, body) = call(
            router(state.clone()),
            post_json(&json!({"tokenIn": "SOL", "tokenOut": "USDC"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: amount");
        assert!(state.queue.store().is_empty());
        assert!(observer.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::post("/api/orders/execute")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(router(state()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let uri = format!("/api/orders/{}", uuid::Uuid::new_v4());
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = call(router(state()), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("Order not found"));
    }

    #[tokio::test]
    async fn test_get_order_snapshot() {
        let state = state();
        let (_, submitted) = call(
            router(state.clone()),
            post_json(&json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": "2"})),
        )
        .await;
        let id = submitted["orderId"].as_str().unwrap();

        let request = Request::get(format!("/api/orders/{id}")).body(Body::empty()).unwrap();
        let (status, body) = call(router(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orderId"], id);
        assert_eq!(body["tokenIn"], "SOL");
        assert_eq!(body["orderType"], "market");
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(router(state()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_cors_preflight_mirrors_origin() {
        let request = Request::options("/api/orders/execute")
            .header("origin", "http://example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"].to_str().unwrap(),
            "http://example.com"
        );
        assert!(headers.contains_key("access-control-allow-methods"));
        assert!(headers.contains_key("access-control-allow-headers"));
    }

    #[tokio::test]
    async fn test_cross_origin_submit_carries_allow_origin() {
        let request = Request::post("/api/orders/execute")
            .header("origin", "http://dashboard.local")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": 1}).to_string(),
            ))
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"].to_str().unwrap(),
            "http://dashboard.local"
        );
    }
}
