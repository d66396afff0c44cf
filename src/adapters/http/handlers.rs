//! Order API Handlers
//!
//! Thin translation between HTTP and the admission queue. Validation
//! failures never create an order and never reach the broadcast hub.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use super::types::{ErrorResponse, HealthResponse, OrderView, SubmitOrderRequest, SubmitOrderResponse};
use crate::domain::error::ValidationError;

/// `POST /api/orders/execute`
pub async fn submit_order(
    State(state): State<AppState>,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return reject(&state, "malformed_body", rejection.body_text());
        }
    };

    let ticket = match request.into_ticket() {
        Ok(ticket) => ticket,
        Err(err) => return reject(&state, rejection_reason(&err), err.to_string()),
    };

    let order = state.queue.submit(ticket);
    if let Some(metrics) = &state.metrics {
        let order_type = order.order_type.to_string();
        metrics
            .orders_submitted
            .with_label_values(&[order_type.as_str()])
            .inc();
    }
    info!(
        order_id = %order.id,
        pair = %order.pair,
        amount = %order.amount,
        "Order accepted"
    );

    let body = SubmitOrderResponse {
        order_id: order.id,
        status: order.status(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `GET /api/orders/:id`
pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let order = Uuid::parse_str(&id)
        .ok()
        .and_then(|order_id| state.queue.store().get(&order_id));

    match order {
        Some(order) => (StatusCode::OK, Json(OrderView::from(&order))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Order not found: {id}"))),
        )
            .into_response(),
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

fn reject(state: &AppState, reason: &'static str, message: String) -> Response {
    warn!(reason, error = %message, "Order submission rejected");
    if let Some(metrics) = &state.metrics {
        metrics.submissions_rejected.with_label_values(&[reason]).inc();
    }
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

const fn rejection_reason(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingFields(_) => "missing_fields",
        ValidationError::InvalidAmount(_) => "invalid_amount",
        ValidationError::UnsupportedOrderType(_) => "unsupported_order_type",
    }
}
