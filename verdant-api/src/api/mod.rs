//! HTTP API handlers for verdant-api

pub mod form;
pub mod gardens;
pub mod health;
pub mod plants;

pub use gardens::garden_routes;
pub use health::health_routes;
pub use plants::plant_routes;
