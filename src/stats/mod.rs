pub mod aggregator;
pub mod handlers;
pub mod metrics;
pub mod service;

mod errors;
pub mod models;
pub mod repository;

pub use errors::StatsError;
pub use models::*;
pub use repository::{InMemoryStatsRepository, StatsRepository};
pub use service::StatsService;
