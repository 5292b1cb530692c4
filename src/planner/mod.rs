//! Bus itinerary planning over the schedule index.
//!
//! Answers "how do I get from A to B on buses, departing around now?" with
//! direct and one-transfer itineraries bounded by walks at both ends.

mod config;
mod itinerary;
mod search;

pub use config::PlannerConfig;
pub use itinerary::{BusLeg, Itinerary, PathStop, Segment, TransferWait, WalkLeg};
pub use search::{ItineraryPlanner, QueryTime};
