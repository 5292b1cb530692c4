//! Planner tuning knobs.

/// Configuration parameters for itinerary search.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Radius around each endpoint within which stops are considered.
    pub radius_km: f64,

    /// Maximum nearby stops retained per endpoint.
    pub max_nearby_stops: usize,

    /// If direct search finds at least this many itineraries, the transfer
    /// search is skipped.
    pub direct_target: usize,

    /// Number of nearest stops per endpoint fed to the transfer search.
    pub transfer_top_stops: usize,

    /// Maximum acceptable wait at a transfer stop (exclusive), minutes.
    pub max_transfer_wait_mins: i64,

    /// Itineraries at or above this total duration are dropped, minutes.
    pub max_duration_mins: i64,

    /// Maximum number of itineraries to return.
    pub max_results: usize,

    /// Pedestrian speed in metres per minute.
    pub walk_speed_m_per_min: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            radius_km: 2.0,
            max_nearby_stops: 20,
            direct_target: 5,
            transfer_top_stops: 5,
            max_transfer_wait_mins: 45,
            max_duration_mins: 240,
            max_results: 5,
            walk_speed_m_per_min: 80.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.radius_km, 2.0);
        assert_eq!(config.max_nearby_stops, 20);
        assert_eq!(config.direct_target, 5);
        assert_eq!(config.transfer_top_stops, 5);
        assert_eq!(config.max_transfer_wait_mins, 45);
        assert_eq!(config.max_duration_mins, 240);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.walk_speed_m_per_min, 80.0);
    }
}
