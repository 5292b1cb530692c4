//! Static GTFS schedule data.
//!
//! The feed is loaded once at startup and published as an immutable
//! [`ScheduleIndex`]; nothing in here mutates after load.

mod index;
mod loader;
mod model;

pub use index::ScheduleIndex;
pub use loader::{FeedError, GtfsFeed, load_feed};
pub use model::{GtfsTime, Route, ServiceCalendar, Stop, StopTime, TimeParseError, Trip};
