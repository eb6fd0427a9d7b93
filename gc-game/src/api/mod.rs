//! HTTP API handlers for gc-game

pub mod health;
pub mod round;

pub use health::health_routes;
pub use round::round_routes;
