//! Application state for the web layer.

use std::sync::Arc;

use crate::gtfs::ScheduleIndex;
use crate::metro::MetroClient;
use crate::planner::PlannerConfig;
use crate::quotes::QuoteAggregator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Immutable schedule index; `None` when the feed failed to load and
    /// bus planning is disabled.
    pub schedule: Option<Arc<ScheduleIndex>>,

    /// Planner tuning knobs.
    pub planner_config: Arc<PlannerConfig>,

    /// Fare quote aggregator.
    pub aggregator: Arc<QuoteAggregator>,

    /// Metro directions client; `None` when no API key is configured.
    pub metro: Option<Arc<MetroClient>>,
}

impl AppState {
    pub fn new(
        schedule: Option<ScheduleIndex>,
        planner_config: PlannerConfig,
        aggregator: QuoteAggregator,
        metro: Option<MetroClient>,
    ) -> Self {
        Self {
            schedule: schedule.map(Arc::new),
            planner_config: Arc::new(planner_config),
            aggregator: Arc::new(aggregator),
            metro: metro.map(Arc::new),
        }
    }
}
