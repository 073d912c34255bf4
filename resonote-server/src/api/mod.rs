//! HTTP API handlers for resonote-server

pub mod annotations;
pub mod catalog;
pub mod health;

pub use annotations::annotation_routes;
pub use catalog::catalog_routes;
pub use health::health_routes;
