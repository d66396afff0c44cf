//! Order API Request/Response Types
//!
//! JSON bodies of the order API. Field names are camelCase on the wire.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::ValidationError;
use crate::domain::order::{Order, OrderId, OrderStatus, OrderTicket, OrderType};

/// Order submission payload.
///
/// Every field is optional at the JSON level so that missing fields are
/// reported together by [`SubmitOrderRequest::into_ticket`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
    /// Token being sold.
    #[serde(default)]
    pub token_in: Option<String>,
    /// Token being bought.
    #[serde(default)]
    pub token_out: Option<String>,
    /// Amount of `token_in`: a JSON number or a numeric string.
    #[serde(default)]
    pub amount: Option<Value>,
    /// Defaults to `market`.
    #[serde(default)]
    pub order_type: Option<String>,
}

impl SubmitOrderRequest {
    /// Validate the payload into an order ticket.
    ///
    /// # Errors
    /// `MissingFields` when any of `tokenIn`, `tokenOut`, `amount` is absent
    /// or empty, `UnsupportedOrderType` for anything but `market`, and
    /// `InvalidAmount` when the amount is not a positive number.
    pub fn into_ticket(self) -> Result<OrderTicket, ValidationError> {
        let token_in = self.token_in.unwrap_or_default();
        let token_out = self.token_out.unwrap_or_default();

        let mut missing = Vec::new();
        if token_in.trim().is_empty() {
            missing.push("tokenIn");
        }
        if token_out.trim().is_empty() {
            missing.push("tokenOut");
        }
        if is_blank(self.amount.as_ref()) {
            missing.push("amount");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let order_type = match self.order_type.as_deref() {
            None => OrderType::default(),
            Some(raw) => raw.parse()?,
        };
        let amount = parse_amount(self.amount.as_ref().unwrap_or(&Value::Null))?;

        OrderTicket::new(&token_in, &token_out, amount, order_type)
    }
}

fn is_blank(amount: Option<&Value>) -> bool {
    match amount {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parse_amount(value: &Value) -> Result<Decimal, ValidationError> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(ValidationError::InvalidAmount(format!(
                "expected a number, got {other}"
            )));
        }
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| ValidationError::InvalidAmount(format!("not a number: {raw}")))
}

/// Accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Full snapshot of one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: OrderId,
    pub token_in: String,
    pub token_out: String,
    pub amount: Decimal,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(rename = "selectedDex", skip_serializing_if = "Option::is_none")]
    pub selected_venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            token_in: order.pair.token_in.clone(),
            token_out: order.pair.token_out.clone(),
            amount: order.amount,
            order_type: order.order_type,
            status: order.status(),
            selected_venue: order.selected_quote().map(|q| q.venue.clone()),
            quoted_price: order.selected_quote().map(|q| q.price),
            tx_hash: order.tx_hash().map(str::to_string),
            executed_price: order.executed_price(),
            error: order.error().map(str::to_string),
            created_at: order.created_at,
            updated_at: order.updated_at(),
        }
    }
}

/// Liveness body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn parse(body: Value) -> Result<OrderTicket, ValidationError> {
        serde_json::from_value::<SubmitOrderRequest>(body)
            .unwrap()
            .into_ticket()
    }

    #[test]
    fn test_numeric_and_string_amounts() {
        let a = parse(json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": 1.5})).unwrap();
        let b = parse(json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": "1.5"})).unwrap();
        assert_eq!(a.amount, dec!(1.5));
        assert_eq!(b.amount, dec!(1.5));
        assert_eq!(a.order_type, OrderType::Market);
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let err = parse(json!({"tokenIn": "SOL"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["tokenOut", "amount"])
        );
    }

    #[test]
    fn test_null_and_empty_amount_are_missing() {
        for amount in [Value::Null, json!(""), json!("  ")] {
            let err = parse(json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": amount}))
                .unwrap_err();
            assert_eq!(err, ValidationError::MissingFields(vec!["amount"]));
        }
    }

    #[test]
    fn test_bad_amounts_rejected() {
        for amount in [json!(0), json!(-3), json!("abc"), json!(true), json!([1])] {
            let err = parse(json!({"tokenIn": "SOL", "tokenOut": "USDC", "amount": amount}))
                .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidAmount(_)), "{err}");
        }
    }

    #[test]
    fn test_limit_orders_unsupported() {
        let err = parse(json!({
            "tokenIn": "SOL", "tokenOut": "USDC", "amount": 1, "orderType": "limit"
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedOrderType("limit".into()));
    }

    #[test]
    fn test_submit_response_wire_shape() {
        let id = uuid::Uuid::new_v4();
        let body = serde_json::to_value(SubmitOrderResponse {
            order_id: id,
            status: OrderStatus::Pending,
        })
        .unwrap();
        assert_eq!(body, json!({"orderId": id.to_string(), "status": "pending"}));
    }
}
