use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::aggregator::aggregate_season;
use super::metrics::season_advanced_metrics;
use super::models::{
    AdvancedMetrics, GameStatLine, LeaderStat, RecomputeOutcome, SeasonAggregate,
};
use super::repository::StatsRepository;
use super::StatsError;

/// Players need this many games before they appear in the leaders query.
const LEADERS_MIN_GAMES: u32 = 10;

type SeasonKey = (Uuid, String);

/// Orchestrates the stat-line write/delete → season aggregate → advanced
/// metrics pipeline.
///
/// Recomputes for the same (player, season) are serialized through a per-key
/// async mutex so interleaved read-aggregate-write cycles cannot drop a
/// completed write; different keys proceed in parallel. Every recompute is
/// idempotent and safe to re-run after a failure.
pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
    season_locks: Arc<RwLock<HashMap<SeasonKey, Arc<AsyncMutex<()>>>>>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn StatsRepository>) -> Self {
        Self {
            repository,
            season_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records (or replaces) a player's box score for one game and rebuilds
    /// the season artifacts.
    #[instrument(skip(self, line), fields(player_id = %line.player_id, game_id = %line.game_id))]
    pub async fn record_game_stats(
        &self,
        season: &str,
        line: GameStatLine,
    ) -> Result<RecomputeOutcome, StatsError> {
        line.validate()?;

        let player_id = line.player_id;
        self.repository.upsert_game_stat(season, line).await?;
        info!(player_id = %player_id, season, "Game stat line recorded");

        self.recompute_season(player_id, season).await
    }

    /// Deletes a player's box score for one game and rebuilds the season
    /// artifacts for the season it belonged to.
    #[instrument(skip(self))]
    pub async fn delete_game_stats(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<RecomputeOutcome, StatsError> {
        let season = self
            .repository
            .delete_game_stat(player_id, game_id)
            .await?
            .ok_or(StatsError::GameStatsNotFound { player_id, game_id })?;
        info!(player_id = %player_id, game_id = %game_id, season = %season, "Game stat line deleted");

        self.recompute_season(player_id, &season).await
    }

    /// Rebuilds the season aggregate and advanced metrics from the full set
    /// of the player's stat lines for the season.
    ///
    /// When no lines remain, both derived rows are removed so nothing stale
    /// survives the last deletion. If the metrics upsert fails after the
    /// aggregate upsert succeeded, the error surfaces as `MetricsStale` and
    /// re-running this method brings the two rows back in sync.
    #[instrument(skip(self))]
    pub async fn recompute_season(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<RecomputeOutcome, StatsError> {
        let lock = self.season_lock(player_id, season).await;
        let _guard = lock.lock().await;

        let lines = self.repository.list_game_stats(player_id, season).await?;

        let aggregate = match aggregate_season(player_id, season, &lines) {
            Some(aggregate) => aggregate,
            None => {
                debug!(player_id = %player_id, season, "No stat lines remain; clearing season rows");
                self.repository
                    .delete_season_aggregate(player_id, season)
                    .await?;
                self.repository
                    .delete_advanced_metrics(player_id, season)
                    .await?;
                return Ok(RecomputeOutcome::Cleared);
            }
        };

        self.repository
            .upsert_season_aggregate(aggregate.clone())
            .await?;

        // Team context is best-effort; the metrics mark it unavailable
        // rather than substituting a placeholder.
        let team_totals = self
            .repository
            .team_totals_for_player(player_id, season)
            .await?;
        if team_totals.is_none() {
            debug!(player_id = %player_id, season, "No team totals; usage and assist rates unavailable");
        }

        let metrics = season_advanced_metrics(&aggregate, team_totals.as_ref());
        if let Err(source) = self.repository.upsert_advanced_metrics(metrics.clone()).await {
            warn!(
                player_id = %player_id,
                season,
                error = %source,
                "Season aggregate persisted but advanced metrics upsert failed"
            );
            return Err(StatsError::MetricsStale {
                player_id,
                season: season.to_string(),
                source: Box::new(source),
            });
        }

        Ok(RecomputeOutcome::Updated { aggregate, metrics })
    }

    pub async fn get_player_game_stats(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<GameStatLine>, StatsError> {
        self.repository.get_game_stat(player_id, game_id).await
    }

    /// Returns the stored aggregate/metrics pair; either side may be absent.
    pub async fn get_player_season_stats(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<(Option<SeasonAggregate>, Option<AdvancedMetrics>), StatsError> {
        let aggregate = self.repository.get_season_aggregate(player_id, season).await?;
        let metrics = self.repository.get_advanced_metrics(player_id, season).await?;
        Ok((aggregate, metrics))
    }

    pub async fn get_advanced_metrics(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<Option<AdvancedMetrics>, StatsError> {
        self.repository.get_advanced_metrics(player_id, season).await
    }

    /// Computes advanced metrics on demand from the stored aggregate,
    /// without touching persisted rows. Errors with `SeasonNotFound` when
    /// the player has no aggregate for the season.
    pub async fn season_advanced_metrics(
        &self,
        player_id: Uuid,
        season: &str,
    ) -> Result<AdvancedMetrics, StatsError> {
        let aggregate = self
            .repository
            .get_season_aggregate(player_id, season)
            .await?
            .ok_or_else(|| StatsError::SeasonNotFound {
                player_id,
                season: season.to_string(),
            })?;
        let team_totals = self
            .repository
            .team_totals_for_player(player_id, season)
            .await?;
        Ok(season_advanced_metrics(&aggregate, team_totals.as_ref()))
    }

    /// Season leaders for one stat, qualified at ten games played. Points,
    /// rebounds, and assists rank by per-game average; steals and blocks by
    /// season totals.
    #[instrument(skip(self))]
    pub async fn league_leaders(
        &self,
        season: &str,
        stat: LeaderStat,
        limit: usize,
    ) -> Result<Vec<SeasonAggregate>, StatsError> {
        let mut qualified: Vec<SeasonAggregate> = self
            .repository
            .list_season_aggregates(season)
            .await?
            .into_iter()
            .filter(|a| a.games_played >= LEADERS_MIN_GAMES)
            .collect();

        match stat {
            LeaderStat::Points => qualified.sort_by_key(|a| Reverse(a.avg_points)),
            LeaderStat::Rebounds => qualified.sort_by_key(|a| Reverse(a.avg_rebounds)),
            LeaderStat::Assists => qualified.sort_by_key(|a| Reverse(a.avg_assists)),
            LeaderStat::Steals => qualified.sort_by_key(|a| Reverse(a.total_steals)),
            LeaderStat::Blocks => qualified.sort_by_key(|a| Reverse(a.total_blocks)),
        }
        qualified.truncate(limit);

        Ok(qualified)
    }

    async fn season_lock(&self, player_id: Uuid, season: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.season_locks.read().await;
            if let Some(lock) = guard.get(&(player_id, season.to_string())) {
                return lock.clone();
            }
        }

        let mut guard = self.season_locks.write().await;
        guard
            .entry((player_id, season.to_string()))
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::models::{TeamMetric, TeamTotals};
    use crate::stats::repository::InMemoryStatsRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn line(player_id: Uuid, points: u32, fgm: u32, fga: u32) -> GameStatLine {
        GameStatLine {
            player_id,
            game_id: Uuid::new_v4(),
            minutes_played: dec!(32),
            points,
            field_goals_made: fgm,
            field_goals_attempted: fga,
            three_pointers_made: 0,
            three_pointers_attempted: 2,
            free_throws_made: 4,
            free_throws_attempted: 5,
            offensive_rebounds: 1,
            defensive_rebounds: 5,
            total_rebounds: 6,
            assists: 5,
            steals: 1,
            blocks: 1,
            turnovers: 2,
            personal_fouls: 3,
            plus_minus: Some(6),
            recorded_at: Utc::now(),
        }
    }

    /// Delegates everything to an inner in-memory repository but fails the
    /// advanced-metrics upsert, to exercise the partial-failure path.
    struct FailingMetricsRepository {
        inner: InMemoryStatsRepository,
    }

    #[async_trait]
    impl StatsRepository for FailingMetricsRepository {
        async fn upsert_game_stat(
            &self,
            season: &str,
            line: GameStatLine,
        ) -> Result<(), StatsError> {
            self.inner.upsert_game_stat(season, line).await
        }
        async fn get_game_stat(
            &self,
            player_id: Uuid,
            game_id: Uuid,
        ) -> Result<Option<GameStatLine>, StatsError> {
            self.inner.get_game_stat(player_id, game_id).await
        }
        async fn delete_game_stat(
            &self,
            player_id: Uuid,
            game_id: Uuid,
        ) -> Result<Option<String>, StatsError> {
            self.inner.delete_game_stat(player_id, game_id).await
        }
        async fn list_game_stats(
            &self,
            player_id: Uuid,
            season: &str,
        ) -> Result<Vec<GameStatLine>, StatsError> {
            self.inner.list_game_stats(player_id, season).await
        }
        async fn upsert_season_aggregate(
            &self,
            aggregate: SeasonAggregate,
        ) -> Result<(), StatsError> {
            self.inner.upsert_season_aggregate(aggregate).await
        }
        async fn get_season_aggregate(
            &self,
            player_id: Uuid,
            season: &str,
        ) -> Result<Option<SeasonAggregate>, StatsError> {
            self.inner.get_season_aggregate(player_id, season).await
        }
        async fn delete_season_aggregate(
            &self,
            player_id: Uuid,
            season: &str,
        ) -> Result<(), StatsError> {
            self.inner.delete_season_aggregate(player_id, season).await
        }
        async fn list_season_aggregates(
            &self,
            season: &str,
        ) -> Result<Vec<SeasonAggregate>, StatsError> {
            self.inner.list_season_aggregates(season).await
        }
        async fn upsert_advanced_metrics(
            &self,
            _metrics: AdvancedMetrics,
        ) -> Result<(), StatsError> {
            Err(StatsError::Store("metrics table unavailable".to_string()))
        }
        async fn get_advanced_metrics(
            &self,
            player_id: Uuid,
            season: &str,
        ) -> Result<Option<AdvancedMetrics>, StatsError> {
            self.inner.get_advanced_metrics(player_id, season).await
        }
        async fn delete_advanced_metrics(
            &self,
            player_id: Uuid,
            season: &str,
        ) -> Result<(), StatsError> {
            self.inner.delete_advanced_metrics(player_id, season).await
        }
        async fn upsert_team_totals(&self, totals: TeamTotals) -> Result<(), StatsError> {
            self.inner.upsert_team_totals(totals).await
        }
        async fn set_player_team(
            &self,
            player_id: Uuid,
            team_id: Uuid,
        ) -> Result<(), StatsError> {
            self.inner.set_player_team(player_id, team_id).await
        }
        async fn team_totals_for_player(
            &self,
            player_id: Uuid,
            season: &str,
        ) -> Result<Option<TeamTotals>, StatsError> {
            self.inner.team_totals_for_player(player_id, season).await
        }
    }

    #[tokio::test]
    async fn recording_a_line_persists_aggregate_and_metrics() {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let service = StatsService::new(repository.clone());
        let player_id = Uuid::new_v4();

        let outcome = service
            .record_game_stats("2024-25", line(player_id, 24, 10, 18))
            .await
            .unwrap();

        let RecomputeOutcome::Updated { aggregate, metrics } = outcome else {
            panic!("expected an updated season");
        };
        assert_eq!(aggregate.games_played, 1);
        assert_eq!(aggregate.total_points, 24);
        assert_eq!(metrics.usage_rate, TeamMetric::Unavailable);

        let stored = repository
            .get_season_aggregate(player_id, "2024-25")
            .await
            .unwrap();
        assert_eq!(stored, Some(aggregate));
        assert!(repository
            .get_advanced_metrics(player_id, "2024-25")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn rejects_invalid_lines_before_touching_the_store() {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let service = StatsService::new(repository.clone());
        let player_id = Uuid::new_v4();

        let mut bad = line(player_id, 24, 10, 18);
        bad.field_goals_made = 19;

        let err = service
            .record_game_stats("2024-25", bad)
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::Validation(_)));
        assert!(repository
            .list_game_stats(player_id, "2024-25")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_the_last_line_clears_derived_rows() {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let service = StatsService::new(repository.clone());
        let player_id = Uuid::new_v4();
        let stat_line = line(player_id, 24, 10, 18);
        let game_id = stat_line.game_id;

        service
            .record_game_stats("2024-25", stat_line)
            .await
            .unwrap();
        let outcome = service
            .delete_game_stats(player_id, game_id)
            .await
            .unwrap();

        assert_eq!(outcome, RecomputeOutcome::Cleared);
        assert!(repository
            .get_season_aggregate(player_id, "2024-25")
            .await
            .unwrap()
            .is_none());
        assert!(repository
            .get_advanced_metrics(player_id, "2024-25")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_line_reports_not_found() {
        let service = StatsService::new(Arc::new(InMemoryStatsRepository::new()));
        let err = service
            .delete_game_stats(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::GameStatsNotFound { .. }));
    }

    #[tokio::test]
    async fn metrics_upsert_failure_surfaces_as_stale_with_fresh_aggregate() {
        let repository = Arc::new(FailingMetricsRepository {
            inner: InMemoryStatsRepository::new(),
        });
        let service = StatsService::new(repository.clone());
        let player_id = Uuid::new_v4();

        let err = service
            .record_game_stats("2024-25", line(player_id, 24, 10, 18))
            .await
            .unwrap_err();

        assert!(matches!(err, StatsError::MetricsStale { .. }));
        // The aggregate write preceded the failure and must still be visible.
        let aggregate = repository
            .get_season_aggregate(player_id, "2024-25")
            .await
            .unwrap()
            .expect("aggregate should have been persisted");
        assert_eq!(aggregate.games_played, 1);
    }

    #[tokio::test]
    async fn usage_and_assist_rates_compute_when_team_context_exists() {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let service = StatsService::new(repository.clone());
        let player_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();

        repository.set_player_team(player_id, team_id).await.unwrap();
        repository
            .upsert_team_totals(TeamTotals {
                team_id,
                season: "2024-25".to_string(),
                total_field_goals_made: 400,
                total_field_goals_attempted: 850,
                total_free_throws_attempted: 200,
                total_turnovers: 140,
                total_minutes: dec!(2400),
            })
            .await
            .unwrap();

        let outcome = service
            .record_game_stats("2024-25", line(player_id, 24, 10, 18))
            .await
            .unwrap();

        let RecomputeOutcome::Updated { metrics, .. } = outcome else {
            panic!("expected an updated season");
        };
        assert!(matches!(metrics.usage_rate, TeamMetric::Computed(v) if v > 0.0));
        assert!(matches!(metrics.assist_percentage, TeamMetric::Computed(_)));
    }

    #[tokio::test]
    async fn on_demand_metrics_error_when_season_is_unknown() {
        let service = StatsService::new(Arc::new(InMemoryStatsRepository::new()));
        let err = service
            .season_advanced_metrics(Uuid::new_v4(), "2024-25")
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::SeasonNotFound { .. }));
    }

    #[tokio::test]
    async fn league_leaders_respect_qualification_ordering_and_limit() {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let service = StatsService::new(repository.clone());

        let scorers = [(30, 12), (25, 12), (28, 12), (40, 3)];
        for (points, games) in scorers {
            let player_id = Uuid::new_v4();
            for _ in 0..games {
                service
                    .record_game_stats("2024-25", line(player_id, points, 10, 20))
                    .await
                    .unwrap();
            }
        }

        let leaders = service
            .league_leaders("2024-25", LeaderStat::Points, 2)
            .await
            .unwrap();

        // The 40-point scorer misses the 10-game floor.
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].avg_points, dec!(30));
        assert_eq!(leaders[1].avg_points, dec!(28));
    }
}
