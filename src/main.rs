use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::config::AppConfig;
use transit_server::gtfs::{ScheduleIndex, load_feed};
use transit_server::metro::{MetroClient, MetroConfig};
use transit_server::planner::PlannerConfig;
use transit_server::quotes::{
    AggregatorConfig, HttpQuoteProducer, QuoteAggregator, QuoteProducer,
};
use transit_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();

    let schedule = match load_feed(&config.gtfs_dir) {
        Ok(feed) => Some(ScheduleIndex::build(feed)),
        Err(e) => {
            warn!(error = %e, "GTFS feed unavailable; bus planning disabled");
            None
        }
    };

    let mut producers: Vec<Arc<dyn QuoteProducer>> = Vec::new();
    for producer_config in config.enabled_platforms() {
        match HttpQuoteProducer::new(producer_config.clone()) {
            Ok(producer) => producers.push(Arc::new(producer)),
            Err(e) => warn!(
                platform = %producer_config.platform,
                error = %e,
                "failed to build producer; skipped"
            ),
        }
    }
    info!(producers = producers.len(), "fare producers registered");
    let aggregator = QuoteAggregator::new(producers, &AggregatorConfig::default());

    let metro = match &config.metro_api_key {
        Some(key) => match MetroClient::new(MetroConfig::new(key)) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "failed to build metro client; metro disabled");
                None
            }
        },
        None => {
            warn!("GOOGLE_MAPS_API_KEY not set; metro disabled");
            None
        }
    };

    let state = AppState::new(schedule, PlannerConfig::default(), aggregator, metro);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app).await.expect("server error");
}
