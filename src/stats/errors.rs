use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No season stats found for player {player_id} in season {season}")]
    SeasonNotFound { player_id: Uuid, season: String },

    #[error("No game stats found for player {player_id} in game {game_id}")]
    GameStatsNotFound { player_id: Uuid, game_id: Uuid },

    /// The season aggregate was persisted but the advanced-metrics upsert
    /// failed, leaving the metrics row behind the aggregate. Retrying
    /// `recompute_season` for the same key brings them back in sync.
    #[error("Advanced metrics for player {player_id} season {season} are stale: {source}")]
    MetricsStale {
        player_id: Uuid,
        season: String,
        #[source]
        source: Box<StatsError>,
    },
}
