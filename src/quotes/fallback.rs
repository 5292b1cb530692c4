//! Rule-based synthetic quotes.
//!
//! When a platform cannot be queried (or a producer has no upstream at
//! all), quotes are synthesized from the tariff table over great-circle
//! distance. Deterministic except for the surge factor, which is pluggable
//! so tests can pin it.

use chrono::Utc;

use crate::fares::{RandomSurge, SurgeSource, VehicleClass, estimate_fare};
use crate::geo::{Coordinate, haversine_km};

use super::{Confidence, FareQuote, Provenance};

/// Synthesizes one quote per vehicle class from the tariff table.
pub struct FallbackEstimator {
    surge: Box<dyn SurgeSource>,
    currency: String,
}

impl FallbackEstimator {
    pub fn new() -> Self {
        Self::with_surge(Box::new(RandomSurge))
    }

    /// Use a specific surge source (tests pin `FixedSurge(1.0)`).
    pub fn with_surge(surge: Box<dyn SurgeSource>) -> Self {
        Self {
            surge,
            currency: "INR".to_string(),
        }
    }

    /// One estimate per class in `menu`, for a trip from `pickup` to `drop`.
    pub fn estimate(
        &self,
        platform: &str,
        menu: &[VehicleClass],
        pickup: Coordinate,
        drop: Coordinate,
    ) -> Vec<FareQuote> {
        let distance_km = haversine_km(&pickup, &drop);
        let now_ms = Utc::now().timestamp_millis();

        menu.iter()
            .map(|&class| FareQuote {
                platform: platform.to_string(),
                vehicle_class: class.as_str().to_string(),
                price: estimate_fare(class, distance_km, self.surge.surge()),
                currency: self.currency.clone(),
                eta: None,
                confidence: Confidence::Medium,
                provenance: Provenance::Estimate,
                timestamp_ms: now_ms,
            })
            .collect()
    }
}

impl Default for FallbackEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fares::{FixedSurge, tariff};

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn one_quote_per_menu_class() {
        let est = FallbackEstimator::with_surge(Box::new(FixedSurge(1.0)));
        let menu = [VehicleClass::Bike, VehicleClass::Auto];

        let quotes = est.estimate("rapido", &menu, coord(28.70, 77.10), coord(28.75, 77.15));

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].vehicle_class, "bike");
        assert_eq!(quotes[1].vehicle_class, "auto");
        for q in &quotes {
            assert_eq!(q.platform, "rapido");
            assert_eq!(q.provenance, Provenance::Estimate);
            assert_eq!(q.confidence, Confidence::Medium);
            assert_eq!(q.currency, "INR");
        }
    }

    #[test]
    fn price_never_below_minimum() {
        let est = FallbackEstimator::with_surge(Box::new(FixedSurge(1.0)));
        let a = coord(28.7000, 77.1000);

        // Zero-distance trip hits every minimum fare
        let quotes = est.estimate("ola", &VehicleClass::ALL, a, a);
        for (q, class) in quotes.iter().zip(VehicleClass::ALL) {
            assert_eq!(q.price, tariff(class).min_fare);
        }
    }

    #[test]
    fn pinned_surge_is_deterministic() {
        let est = FallbackEstimator::with_surge(Box::new(FixedSurge(1.0)));
        let a = coord(28.70, 77.10);
        let b = coord(28.80, 77.20);

        let first = est.estimate("uber", &[VehicleClass::Sedan], a, b);
        let second = est.estimate("uber", &[VehicleClass::Sedan], a, b);
        assert_eq!(first[0].price, second[0].price);
    }

    #[test]
    fn random_surge_stays_at_or_above_metered_minimum() {
        let est = FallbackEstimator::new();
        let a = coord(28.70, 77.10);
        let b = coord(28.80, 77.20);

        for _ in 0..20 {
            let quotes = est.estimate("uber", &VehicleClass::ALL, a, b);
            for (q, class) in quotes.iter().zip(VehicleClass::ALL) {
                assert!(q.price >= tariff(class).min_fare);
            }
        }
    }
}
