//! Engine wiring.
//!
//! Builds the store, broadcast hub, quote aggregator, pipeline and
//! admission queue from an `AppConfig`. Shared by the binary, the HTTP
//! tests and the integration tests.

use std::sync::Arc;

use tracing::info;

use crate::adapters::broadcast::BroadcastHub;
use crate::adapters::venues::build_venues;
use crate::config::AppConfig;
use crate::ports::publisher::UpdatePublisher;
use crate::ports::venue::VenueClient;
use crate::usecases::{
    AdmissionQueue, ExecutionPipeline, OrderStore, PipelineSettings, QuoteAggregator,
};

/// Handles to the running engine's shared components.
#[derive(Clone)]
pub struct Engine {
    pub store: Arc<OrderStore>,
    pub queue: Arc<AdmissionQueue>,
    pub hub: Arc<BroadcastHub>,
}

impl Engine {
    /// Wire an engine with one simulated venue per `[[venues]]` entry.
    pub fn build(config: &AppConfig) -> Self {
        Self::with_venues(config, build_venues(&config.venues))
    }

    /// Wire an engine around caller-provided venues.
    pub fn with_venues(config: &AppConfig, venues: Vec<Arc<dyn VenueClient>>) -> Self {
        let store = Arc::new(OrderStore::new());
        let hub = Arc::new(BroadcastHub::new(config.broadcast.capacity));

        let venue_ids: Vec<_> = venues.iter().map(|v| v.id()).collect();
        let aggregator = QuoteAggregator::new(
            venues,
            config.pipeline.quote_timeout(),
            config.pipeline.venue_failure_policy,
        );
        let pipeline = Arc::new(ExecutionPipeline::new(
            Arc::clone(&store),
            aggregator,
            Arc::clone(&hub) as Arc<dyn UpdatePublisher>,
            PipelineSettings::from(&config.pipeline),
        ));
        let queue = AdmissionQueue::new(Arc::clone(&store), pipeline, config.queue.max_concurrent);

        info!(
            venues = ?venue_ids,
            max_concurrent = config.queue.max_concurrent,
            policy = ?config.pipeline.venue_failure_policy,
            "Engine wired"
        );

        Self { store, queue, hub }
    }
}
