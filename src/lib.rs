// Library crate for the basketball stats engine
// This file exposes the public API for integration tests

pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use shared::{AppError, AppState};
pub use stats::{
    AdvancedMetrics, GameStatLine, InMemoryStatsRepository, LeaderStat, RecomputeOutcome,
    SeasonAggregate, StatsError, StatsRepository, StatsService, TeamMetric, TeamTotals,
};
