//! Ride-hailing fare quotes.
//!
//! Each upstream platform is wrapped in a [`QuoteProducer`]; the
//! [`QuoteAggregator`] fans out to all of them in parallel, tolerates any
//! of them failing, and caches merged results briefly.

use async_trait::async_trait;

use crate::geo::Coordinate;

mod aggregator;
mod error;
mod fallback;
mod producers;

pub use aggregator::{AggregatorConfig, QuoteAggregator};
pub use error::ProducerError;
pub use fallback::FallbackEstimator;
pub use producers::{HttpQuoteProducer, ProducerConfig};

/// How much to trust a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Fetched from the platform for this request.
    Live,
    /// Synthesized by the fallback estimator.
    Estimate,
    /// Served from the aggregator cache.
    Cached,
    /// Extracted from the platform's app surface.
    Scraped,
    /// Fetched through an official platform API.
    Api,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Estimate => "estimate",
            Provenance::Cached => "cached",
            Provenance::Scraped => "scraped",
            Provenance::Api => "api",
        }
    }
}

/// One fare estimate for one vehicle class on one platform.
#[derive(Debug, Clone)]
pub struct FareQuote {
    pub platform: String,
    pub vehicle_class: String,
    /// Whole currency units.
    pub price: i64,
    pub currency: String,
    pub eta: Option<String>,
    pub confidence: Confidence,
    pub provenance: Provenance,
    pub timestamp_ms: i64,
}

impl FareQuote {
    /// Copy of this quote re-marked as served from cache.
    pub fn as_cached(&self) -> FareQuote {
        FareQuote {
            provenance: Provenance::Cached,
            ..self.clone()
        }
    }
}

/// A source of fare quotes for one platform.
///
/// Implementations are expected to be slow and unreliable; a producer must
/// never fail to its caller. On any internal failure it substitutes
/// fallback estimates, so the returned list is possibly synthetic but
/// always well-formed.
#[async_trait]
pub trait QuoteProducer: Send + Sync {
    /// Platform this producer targets, e.g. "rapido".
    fn platform_name(&self) -> &str;

    /// Quotes for a trip. Infallible by contract.
    async fn quote(&self, pickup: Coordinate, drop: Coordinate) -> Vec<FareQuote>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_wire_names() {
        assert_eq!(Provenance::Live.as_str(), "live");
        assert_eq!(Provenance::Estimate.as_str(), "estimate");
        assert_eq!(Provenance::Cached.as_str(), "cached");
        assert_eq!(Provenance::Scraped.as_str(), "scraped");
        assert_eq!(Provenance::Api.as_str(), "api");
    }

    #[test]
    fn as_cached_only_changes_provenance() {
        let quote = FareQuote {
            platform: "rapido".into(),
            vehicle_class: "bike".into(),
            price: 45,
            currency: "INR".into(),
            eta: Some("3 min".into()),
            confidence: Confidence::High,
            provenance: Provenance::Live,
            timestamp_ms: 1_700_000_000_000,
        };

        let cached = quote.as_cached();
        assert_eq!(cached.provenance, Provenance::Cached);
        assert_eq!(cached.platform, quote.platform);
        assert_eq!(cached.price, quote.price);
        assert_eq!(cached.confidence, quote.confidence);
    }
}
