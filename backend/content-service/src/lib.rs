/// Content Service Library
///
/// Content interaction and feed engine for the BlockTube creator platform:
/// likes, comments, views and purchases whose counters stay consistent under
/// concurrent requests, plus the paginated feed and search queries behind
/// every listing page.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Content items, comments, purchases, feed projections
/// - `services`: Business logic layer
/// - `db`: Storage contracts with PostgreSQL and in-memory implementations
/// - `middleware`: Bearer-token identity and request metrics
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
