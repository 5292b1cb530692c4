//! Parallel fan-out over quote producers with short-lived caching.
//!
//! Producers are queried concurrently, one task each; a producer that
//! fails internally already substituted its own fallback estimates, so the
//! aggregator treats every producer as answering. Merged results are
//! cached for a short window keyed by coarsened coordinates, so repeated
//! lookups from the same block don't hammer the upstreams.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache as MokaCache;
use tracing::{debug, instrument, warn};

use crate::geo::Coordinate;

use super::{FareQuote, QuoteProducer};

/// Cache key: both endpoints rounded to 4 decimal places (~11 m).
type CoordKey = (i64, i64, i64, i64);

fn cache_key(pickup: Coordinate, drop: Coordinate) -> CoordKey {
    let r = |v: f64| (v * 10_000.0).round() as i64;
    (r(pickup.lat()), r(pickup.lng()), r(drop.lat()), r(drop.lng()))
}

/// Configuration for the aggregator cache.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// TTL for cached quote lists.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 10_000,
        }
    }
}

/// Fans out a fare request to every registered producer.
pub struct QuoteAggregator {
    producers: Vec<Arc<dyn QuoteProducer>>,
    cache: MokaCache<CoordKey, Arc<Vec<FareQuote>>>,
}

impl QuoteAggregator {
    /// Create an aggregator over producers in their registration order;
    /// that order is preserved in merged results.
    pub fn new(producers: Vec<Arc<dyn QuoteProducer>>, config: &AggregatorConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { producers, cache }
    }

    /// Quotes for a trip, merged across all producers.
    ///
    /// A fresh cache entry short-circuits the fan-out; its quotes come back
    /// re-marked as cached. Otherwise every producer runs in its own task,
    /// results are concatenated in registration order, and a non-empty
    /// merge is cached.
    #[instrument(skip_all)]
    pub async fn get_quotes(&self, pickup: Coordinate, drop: Coordinate) -> Vec<FareQuote> {
        let key = cache_key(pickup, drop);

        if let Some(hit) = self.cache.get(&key).await {
            debug!(count = hit.len(), "serving quotes from cache");
            return hit.iter().map(FareQuote::as_cached).collect();
        }

        let tasks: Vec<_> = self
            .producers
            .iter()
            .map(|producer| {
                let producer = Arc::clone(producer);
                tokio::spawn(async move { producer.quote(pickup, drop).await })
            })
            .collect();

        let mut merged = Vec::new();
        for (result, producer) in join_all(tasks).await.into_iter().zip(&self.producers) {
            match result {
                Ok(quotes) => merged.extend(quotes),
                // A panicked producer task is dropped; the others stand
                Err(e) => warn!(
                    platform = producer.platform_name(),
                    error = %e,
                    "producer task died"
                ),
            }
        }

        debug!(count = merged.len(), "merged producer quotes");

        if !merged.is_empty() {
            self.cache.insert(key, Arc::new(merged.clone())).await;
        }

        merged
    }
}
