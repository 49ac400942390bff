//! HTTP handlers for relay-service.

pub mod email;
pub mod health;
pub mod scrape;
pub mod verify;

pub use health::health_check;
