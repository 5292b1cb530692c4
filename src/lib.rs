//! Multi-modal trip comparison server.
//!
//! Answers "how do I get from here to there, and what will it cost?" by
//! combining bus itineraries planned over a static GTFS feed with
//! ride-hailing fare estimates aggregated from several platforms.

pub mod config;
pub mod fares;
pub mod geo;
pub mod gtfs;
pub mod metro;
pub mod planner;
pub mod quotes;
pub mod web;
