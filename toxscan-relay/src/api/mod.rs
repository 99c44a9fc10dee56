//! HTTP API handlers for toxscan-relay

pub mod analyze;
pub mod buildinfo;
pub mod health;

pub use analyze::analyze_audio;
pub use buildinfo::get_build_info;
pub use health::health_routes;
