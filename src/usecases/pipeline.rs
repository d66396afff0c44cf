//! Execution Pipeline - Single Order State Machine Driver
//!
//! Drives one admitted order through its stages:
//! `routing → building → submitted → confirmed`
//!
//! Every transition is committed to the store and published before the
//! next stage starts, so observers see each stage in order. Any error
//! moves the order to `failed` with the error description; there is no
//! retry and the caller always gets control back to release the slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use super::error::ExecutionError;
use super::order_store::OrderStore;
use super::quote_aggregator::{QuoteAggregator, RoutedQuote};
use crate::config::PipelineConfig;
use crate::domain::order::{Order, OrderEvent, OrderId, OrderStatus};
use crate::domain::quote::{SwapReceipt, is_valid_tx_hash};
use crate::ports::publisher::UpdatePublisher;

/// Stage timings for the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
  /// Simulated transaction build time.
  pub build_delay: Duration,
  /// Deadline for the venue execute call.
  pub execute_timeout: Duration,
}

impl From<&PipelineConfig> for PipelineSettings {
  fn from(config: &PipelineConfig) -> Self {
    Self {
      build_delay: config.build_delay(),
      execute_timeout: config.execute_timeout(),
    }
  }
}

/// Drives admitted orders to a terminal status.
pub struct ExecutionPipeline {
  store: Arc<OrderStore>,
  aggregator: QuoteAggregator,
  publisher: Arc<dyn UpdatePublisher>,
  settings: PipelineSettings,
}

impl ExecutionPipeline {
  pub fn new(
    store: Arc<OrderStore>,
    aggregator: QuoteAggregator,
    publisher: Arc<dyn UpdatePublisher>,
    settings: PipelineSettings,
  ) -> Self {
    Self {
      store,
      aggregator,
      publisher,
      settings,
    }
  }

  /// Move a pending order to `routing` and broadcast it.
  ///
  /// The admission queue calls this while it holds its slot lock, so an
  /// order holds a slot exactly when it has left `pending`.
  ///
  /// # Errors
  /// `UnknownOrder` or `Transition` when the order is not pending.
  pub fn admit(&self, order_id: OrderId) -> Result<Order, ExecutionError> {
    self.advance(order_id, OrderEvent::Admitted)
  }

  /// Run one order to completion. Returns its terminal status.
  ///
  /// Pending orders are admitted first; admitted (`routing`) orders
  /// continue from quoting. Orders already past routing are left alone.
  /// Never returns an error: failures are recorded on the order.
  #[instrument(skip(self))]
  pub async fn process(&self, order_id: OrderId) -> OrderStatus {
    let order = match self.store.get(&order_id) {
      Some(order) if order.status() == OrderStatus::Pending => match self.admit(order_id) {
        Ok(order) => order,
        Err(e) => {
          warn!(error = %e, "Order could not be admitted");
          return self.store.status(&order_id).unwrap_or(OrderStatus::Failed);
        }
      },
      Some(order) if order.status() == OrderStatus::Routing => order,
      Some(order) => {
        debug!(status = %order.status(), "Order not runnable, skipping");
        return order.status();
      }
      None => {
        warn!("Order not found, skipping");
        return OrderStatus::Failed;
      }
    };

    match self.drive(order).await {
      Ok(order) => {
        info!(
          venue = order.selected_quote().map(|q| q.venue.as_str()),
          executed_price = order.executed_price(),
          tx_hash = order.tx_hash(),
          "Order confirmed"
        );
        order.status()
      }
      Err(e) => {
        warn!(error = %e, "Order failed");
        self.fail(order_id, &e)
      }
    }
  }

  /// Quote, build and execute an order already in `routing`.
  async fn drive(&self, order: Order) -> Result<Order, ExecutionError> {
    let order_id = order.id;
    let routed = self.aggregator.best_quote(&order).await?;
    let order = self.advance(order_id, OrderEvent::Routed(routed.quote.clone()))?;

    self.build(&order).await;
    let order = self.advance(order_id, OrderEvent::Built)?;

    let receipt = self.execute(&order, &routed).await?;
    self.advance(order_id, OrderEvent::Confirmed(receipt))
  }

  /// Commit a transition, then broadcast it.
  fn advance(&self, order_id: OrderId, event: OrderEvent) -> Result<Order, ExecutionError> {
    let order = self.store.apply(&order_id, event)?;
    let observers = self.publisher.publish(order.update());
    debug!(status = %order.status(), observers, "Stage advanced");
    Ok(order)
  }

  /// Transaction construction stand-in (signing, fee estimation).
  async fn build(&self, _order: &Order) {
    tokio::time::sleep(self.settings.build_delay).await;
  }

  async fn execute(&self, order: &Order, routed: &RoutedQuote) -> Result<SwapReceipt, ExecutionError> {
    let venue = routed.venue.id();
    let receipt = match timeout(
      self.settings.execute_timeout,
      routed.venue.execute(order, &routed.quote),
    )
    .await
    {
      Err(_) => {
        return Err(ExecutionError::StageTimeout {
          stage: "execute",
          venue,
          timeout_ms: self.settings.execute_timeout.as_millis() as u64,
        });
      }
      Ok(Err(e)) => {
        return Err(ExecutionError::ExecutionFailed {
          venue,
          reason: format!("{e:#}"),
        });
      }
      Ok(Ok(receipt)) => receipt,
    };

    if !is_valid_tx_hash(&receipt.tx_hash) {
      return Err(ExecutionError::ExecutionFailed {
        venue,
        reason: format!("malformed transaction reference {:?}", receipt.tx_hash),
      });
    }
    Ok(receipt)
  }

  /// Record the failure on the order and broadcast it.
  fn fail(&self, order_id: OrderId, cause: &ExecutionError) -> OrderStatus {
    match self.advance(order_id, OrderEvent::Failed(cause.to_string())) {
      Ok(order) => order.status(),
      Err(e) => {
        error!(error = %e, "Could not record order failure");
        self.store.status(&order_id).unwrap_or(OrderStatus::Failed)
      }
    }
  }
}
