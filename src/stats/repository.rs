use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::models::{AdvancedMetrics, GameStatLine, SeasonAggregate, TeamTotals};
use super::StatsError;

/// Durable storage for box-score lines and the derived season artifacts.
///
/// Game stat lines are the source of truth; season aggregates and advanced
/// metrics are materialized views written only by the stats service. Team
/// totals are best-effort context: implementations return `None` when the
/// player's roster link or the team's totals are unknown.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn upsert_game_stat(&self, season: &str, line: GameStatLine) -> Result<(), StatsError>;
    async fn get_game_stat(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<GameStatLine>, StatsError>;
    /// Removes a stat line, returning the season it belonged to so the
    /// caller can recompute. `None` when no such line exists.
    async fn delete_game_stat(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<String>, StatsError>;
    async fn list_game_stats(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Vec<GameStatLine>, StatsError>;

    async fn upsert_season_aggregate(&self, aggregate: SeasonAggregate) -> Result<(), StatsError>;
    async fn get_season_aggregate(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<SeasonAggregate>, StatsError>;
    async fn delete_season_aggregate(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<(), StatsError>;
    async fn list_season_aggregates(&self, season: &str)
        -> Result<Vec<SeasonAggregate>, StatsError>;

    async fn upsert_advanced_metrics(&self, metrics: AdvancedMetrics) -> Result<(), StatsError>;
    async fn get_advanced_metrics(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<AdvancedMetrics>, StatsError>;
    async fn delete_advanced_metrics(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<(), StatsError>;

    async fn upsert_team_totals(&self, totals: TeamTotals) -> Result<(), StatsError>;
    async fn set_player_team(&self, player_id: Uuid, team_id: Uuid) -> Result<(), StatsError>;
    async fn team_totals_for_player(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<TeamTotals>, StatsError>;
}

type SeasonKey = (Uuid, String);

/// In-memory implementation of `StatsRepository` for development and testing.
#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    // Stat lines keyed by (player, game); the season tag rides alongside so
    // per-season queries stay cheap without a game entity table.
    game_stats: Arc<RwLock<HashMap<(Uuid, Uuid), (String, GameStatLine)>>>,
    season_aggregates: Arc<RwLock<HashMap<SeasonKey, SeasonAggregate>>>,
    advanced_metrics: Arc<RwLock<HashMap<SeasonKey, AdvancedMetrics>>>,
    team_totals: Arc<RwLock<HashMap<SeasonKey, TeamTotals>>>,
    player_teams: Arc<RwLock<HashMap<Uuid, Uuid>>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    #[instrument(skip(self, line))]
    async fn upsert_game_stat(&self, season: &str, line: GameStatLine) -> Result<(), StatsError> {
        debug!(player_id = %line.player_id, game_id = %line.game_id, season, "Upserting game stat line");
        let mut stats = self.game_stats.write().await;
        stats.insert(
            (line.player_id, line.game_id),
            (season.to_string(), line),
        );
        Ok(())
    }

    async fn get_game_stat(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<GameStatLine>, StatsError> {
        let stats = self.game_stats.read().await;
        Ok(stats.get(&(player_id, game_id)).map(|(_, line)| line.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_game_stat(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<String>, StatsError> {
        let mut stats = self.game_stats.write().await;
        let removed = stats.remove(&(player_id, game_id));
        match &removed {
            Some((season, _)) => {
                debug!(player_id = %player_id, game_id = %game_id, season, "Deleted game stat line")
            }
            None => debug!(player_id = %player_id, game_id = %game_id, "No game stat line to delete"),
        }
        Ok(removed.map(|(season, _)| season))
    }

    async fn list_game_stats(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Vec<GameStatLine>, StatsError> {
        let stats = self.game_stats.read().await;
        Ok(stats
            .values()
            .filter(|(s, line)| line.player_id == player_id && s == season)
            .map(|(_, line)| line.clone())
            .collect())
    }

    #[instrument(skip(self, aggregate))]
    async fn upsert_season_aggregate(&self, aggregate: SeasonAggregate) -> Result<(), StatsError> {
        debug!(
            player_id = %aggregate.player_id,
            season = %aggregate.season,
            games_played = aggregate.games_played,
            "Upserting season aggregate"
        );
        let mut aggregates = self.season_aggregates.write().await;
        aggregates.insert(
            (aggregate.player_id, aggregate.season.clone()),
            aggregate,
        );
        Ok(())
    }

    async fn get_season_aggregate(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<SeasonAggregate>, StatsError> {
        let aggregates = self.season_aggregates.read().await;
        Ok(aggregates.get(&(player_id, season.to_string())).cloned())
    }

    async fn delete_season_aggregate(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<(), StatsError> {
        let mut aggregates = self.season_aggregates.write().await;
        aggregates.remove(&(player_id, season.to_string()));
        Ok(())
    }

    async fn list_season_aggregates(
        &self,
        season: &str,
    ) -> Result<Vec<SeasonAggregate>, StatsError> {
        let aggregates = self.season_aggregates.read().await;
        Ok(aggregates
            .values()
            .filter(|a| a.season == season)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, metrics))]
    async fn upsert_advanced_metrics(&self, metrics: AdvancedMetrics) -> Result<(), StatsError> {
        debug!(player_id = %metrics.player_id, season = %metrics.season, "Upserting advanced metrics");
        let mut rows = self.advanced_metrics.write().await;
        rows.insert((metrics.player_id, metrics.season.clone()), metrics);
        Ok(())
    }

    async fn get_advanced_metrics(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<AdvancedMetrics>, StatsError> {
        let rows = self.advanced_metrics.read().await;
        Ok(rows.get(&(player_id, season.to_string())).cloned())
    }

    async fn delete_advanced_metrics(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<(), StatsError> {
        let mut rows = self.advanced_metrics.write().await;
        rows.remove(&(player_id, season.to_string()));
        Ok(())
    }

    async fn upsert_team_totals(&self, totals: TeamTotals) -> Result<(), StatsError> {
        let mut rows = self.team_totals.write().await;
        rows.insert((totals.team_id, totals.season.clone()), totals);
        Ok(())
    }

    async fn set_player_team(&self, player_id: Uuid, team_id: Uuid) -> Result<(), StatsError> {
        let mut rows = self.player_teams.write().await;
        rows.insert(player_id, team_id);
        Ok(())
    }

    async fn team_totals_for_player(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<TeamTotals>, StatsError> {
        let team_id = {
            let teams = self.player_teams.read().await;
            match teams.get(&player_id) {
                Some(team_id) => *team_id,
                None => return Ok(None),
            }
        };
        let rows = self.team_totals.read().await;
        Ok(rows.get(&(team_id, season.to_string())).cloned())
    }
}
