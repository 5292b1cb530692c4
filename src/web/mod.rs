//! HTTP transport layer.
//!
//! Request validation in, wire-shaped JSON out. The wire shapes are
//! consumed by an existing client, so field names and formats here are
//! load-bearing.

mod dto;
mod routes;
mod state;

pub use routes::{AppError, create_router};
pub use state::AppState;
