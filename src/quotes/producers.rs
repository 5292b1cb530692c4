//! HTTP-backed quote producers.
//!
//! Each platform's quote surface is reached through a bridge endpoint that
//! hides session management and scraping behind a small JSON contract:
//! `GET {base}/v1/quotes` returns an array of `{vehicle_type, price,
//! currency?, eta?}`. Whatever goes wrong upstream, the producer answers
//! with fallback estimates instead of an error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::fares::VehicleClass;
use crate::geo::Coordinate;

use super::error::ProducerError;
use super::fallback::FallbackEstimator;
use super::{Confidence, FareQuote, Provenance, QuoteProducer};

/// Hard upper bound on a producer's upstream wait.
const MAX_TIMEOUT_SECS: u64 = 20;

/// Configuration for one platform producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Platform name, e.g. "rapido".
    pub platform: String,
    /// Bridge endpoint base URL. `None` makes the producer estimate-only.
    pub base_url: Option<String>,
    /// Vehicle classes this platform offers.
    pub menu: Vec<VehicleClass>,
    /// Upstream deadline in seconds, clamped to 20.
    pub timeout_secs: u64,
}

impl ProducerConfig {
    pub fn new(platform: impl Into<String>, menu: Vec<VehicleClass>) -> Self {
        Self {
            platform: platform.into(),
            base_url: None,
            menu,
            timeout_secs: 10,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.min(MAX_TIMEOUT_SECS);
        self
    }
}

/// One quote row as returned by a platform bridge.
#[derive(Debug, Deserialize)]
struct UpstreamQuote {
    vehicle_type: String,
    price: i64,
    currency: Option<String>,
    eta: Option<String>,
}

/// Producer that fetches live quotes over HTTP, with estimate fallback.
pub struct HttpQuoteProducer {
    config: ProducerConfig,
    http: reqwest::Client,
    fallback: FallbackEstimator,
}

impl HttpQuoteProducer {
    pub fn new(config: ProducerConfig) -> Result<Self, ProducerError> {
        Self::with_fallback(config, FallbackEstimator::new())
    }

    /// Use a specific fallback estimator (tests pin the surge source).
    pub fn with_fallback(
        config: ProducerConfig,
        fallback: FallbackEstimator,
    ) -> Result<Self, ProducerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.min(MAX_TIMEOUT_SECS)))
            .build()?;

        Ok(Self {
            config,
            http,
            fallback,
        })
    }

    async fn fetch_live(
        &self,
        pickup: Coordinate,
        drop: Coordinate,
    ) -> Result<Vec<FareQuote>, ProducerError> {
        let base = self
            .config
            .base_url
            .as_deref()
            .ok_or(ProducerError::NotConfigured)?;

        let url = format!("{base}/v1/quotes");
        let deadline = Duration::from_secs(self.config.timeout_secs.min(MAX_TIMEOUT_SECS));

        let request = self.http.get(&url).query(&[
            ("pickup_lat", pickup.lat().to_string()),
            ("pickup_lng", pickup.lng().to_string()),
            ("drop_lat", drop.lat().to_string()),
            ("drop_lng", drop.lng().to_string()),
        ]);

        let response = tokio::time::timeout(deadline, request.send())
            .await
            .map_err(|_| ProducerError::Timeout)??;

        let status = response.status();

        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(ProducerError::Blocked);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProducerError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let rows: Vec<UpstreamQuote> =
            serde_json::from_str(&body).map_err(|e| ProducerError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        let now_ms = Utc::now().timestamp_millis();
        Ok(rows
            .into_iter()
            .map(|row| FareQuote {
                platform: self.config.platform.clone(),
                vehicle_class: row.vehicle_type,
                price: row.price,
                currency: row.currency.unwrap_or_else(|| "INR".to_string()),
                eta: row.eta,
                confidence: Confidence::High,
                provenance: Provenance::Live,
                timestamp_ms: now_ms,
            })
            .collect())
    }
}

#[async_trait]
impl QuoteProducer for HttpQuoteProducer {
    fn platform_name(&self) -> &str {
        &self.config.platform
    }

    async fn quote(&self, pickup: Coordinate, drop: Coordinate) -> Vec<FareQuote> {
        match self.fetch_live(pickup, drop).await {
            Ok(quotes) if !quotes.is_empty() => {
                debug!(
                    platform = %self.config.platform,
                    count = quotes.len(),
                    "live quotes fetched"
                );
                quotes
            }
            Ok(_) => {
                warn!(platform = %self.config.platform, "upstream returned no quotes; estimating");
                self.fallback
                    .estimate(&self.config.platform, &self.config.menu, pickup, drop)
            }
            Err(e) => {
                warn!(platform = %self.config.platform, error = %e, "live fetch failed; estimating");
                self.fallback
                    .estimate(&self.config.platform, &self.config.menu, pickup, drop)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fares::FixedSurge;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn config_builder() {
        let config = ProducerConfig::new("rapido", vec![VehicleClass::Bike, VehicleClass::Auto])
            .with_base_url("http://localhost:9000")
            .with_timeout(5);

        assert_eq!(config.platform, "rapido");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn timeout_clamped_to_hard_bound() {
        let config = ProducerConfig::new("ola", vec![VehicleClass::Mini]).with_timeout(120);
        assert_eq!(config.timeout_secs, 20);
    }

    #[tokio::test]
    async fn unconfigured_producer_estimates() {
        let config = ProducerConfig::new("rapido", vec![VehicleClass::Bike, VehicleClass::Auto]);
        let producer = HttpQuoteProducer::with_fallback(
            config,
            FallbackEstimator::with_surge(Box::new(FixedSurge(1.0))),
        )
        .unwrap();

        let quotes = producer
            .quote(coord(28.70, 77.10), coord(28.75, 77.15))
            .await;

        assert_eq!(quotes.len(), 2);
        for q in &quotes {
            assert_eq!(q.platform, "rapido");
            assert_eq!(q.provenance, Provenance::Estimate);
            assert_eq!(q.confidence, Confidence::Medium);
        }
    }

    #[tokio::test]
    async fn unreachable_upstream_estimates() {
        // Nothing listens on this port; the fetch fails fast and the
        // producer must still answer with estimates.
        let config = ProducerConfig::new("ola", vec![VehicleClass::Mini])
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(2);
        let producer = HttpQuoteProducer::with_fallback(
            config,
            FallbackEstimator::with_surge(Box::new(FixedSurge(1.0))),
        )
        .unwrap();

        let quotes = producer
            .quote(coord(28.70, 77.10), coord(28.75, 77.15))
            .await;

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].vehicle_class, "mini");
        assert_eq!(quotes[0].provenance, Provenance::Estimate);
    }

    // Live-path tests against a real bridge would make network calls;
    // they belong in an ignored integration suite.
}
