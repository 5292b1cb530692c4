//! Environment configuration.
//!
//! Everything is optional with sensible defaults so a bare `cargo run`
//! serves fallback estimates and, given a feed directory, bus itineraries.

use std::env;
use std::path::PathBuf;

use crate::fares::VehicleClass;
use crate::quotes::ProducerConfig;

/// A platform entry: its producer configuration plus an enable switch.
#[derive(Debug, Clone)]
pub struct PlatformEntry {
    pub config: ProducerConfig,
    pub enabled: bool,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,

    /// Directory holding the static GTFS files.
    pub gtfs_dir: PathBuf,

    /// Ride-hailing platforms, in fan-out order.
    pub platforms: Vec<PlatformEntry>,

    /// API key for the external metro directions provider.
    pub metro_api_key: Option<String>,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// Per platform `NAME`: `NAME_ENABLED` (default on, "0"/"false" to
    /// disable) and `NAME_QUOTES_URL` for the bridge endpoint (absent means
    /// estimate-only).
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);

        let gtfs_dir = env::var("GTFS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/gtfs"));

        let platforms = default_platforms()
            .into_iter()
            .map(|mut config| {
                let prefix = config.platform.to_uppercase();
                if let Ok(url) = env::var(format!("{prefix}_QUOTES_URL")) {
                    config = config.with_base_url(url);
                }
                let enabled = env::var(format!("{prefix}_ENABLED"))
                    .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
                    .unwrap_or(true);
                PlatformEntry { config, enabled }
            })
            .collect();

        let metro_api_key = env::var("GOOGLE_MAPS_API_KEY").ok().filter(|k| !k.is_empty());

        Self {
            port,
            gtfs_dir,
            platforms,
            metro_api_key,
        }
    }

    /// Configs of the enabled platforms, in fan-out order.
    pub fn enabled_platforms(&self) -> impl Iterator<Item = &ProducerConfig> {
        self.platforms
            .iter()
            .filter(|p| p.enabled)
            .map(|p| &p.config)
    }
}

/// The built-in platform set with each platform's vehicle menu.
fn default_platforms() -> Vec<ProducerConfig> {
    vec![
        ProducerConfig::new("rapido", vec![VehicleClass::Bike, VehicleClass::Auto]),
        ProducerConfig::new(
            "ola",
            vec![
                VehicleClass::Auto,
                VehicleClass::Mini,
                VehicleClass::Sedan,
                VehicleClass::Suv,
            ],
        ),
        ProducerConfig::new(
            "uber",
            vec![
                VehicleClass::Auto,
                VehicleClass::Mini,
                VehicleClass::Sedan,
                VehicleClass::Suv,
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_platform_set() {
        let platforms = default_platforms();
        let names: Vec<_> = platforms.iter().map(|p| p.platform.as_str()).collect();
        assert_eq!(names, ["rapido", "ola", "uber"]);

        // Bikes are a rapido thing; the cab platforms carry the car menu
        assert!(platforms[0].menu.contains(&VehicleClass::Bike));
        assert!(platforms[1].menu.contains(&VehicleClass::Suv));
        assert!(!platforms[1].menu.contains(&VehicleClass::Bike));
    }

    #[test]
    fn enabled_platforms_filters() {
        let mut config = AppConfig {
            port: 8000,
            gtfs_dir: PathBuf::from("data/gtfs"),
            platforms: default_platforms()
                .into_iter()
                .map(|config| PlatformEntry {
                    config,
                    enabled: true,
                })
                .collect(),
            metro_api_key: None,
        };
        config.platforms[1].enabled = false;

        let names: Vec<_> = config
            .enabled_platforms()
            .map(|p| p.platform.as_str())
            .collect();
        assert_eq!(names, ["rapido", "uber"]);
    }
}
