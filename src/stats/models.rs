use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::StatsError;

/// Regulation game length; minutes played cannot exceed this.
pub const MAX_MINUTES_PER_GAME: Decimal = dec!(48);

/// One player's box score for one game. At most one line exists per
/// (player_id, game_id) pair.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatLine {
    pub player_id: Uuid,
    pub game_id: Uuid,
    pub minutes_played: Decimal,
    pub points: u32,
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub three_pointers_made: u32,
    pub three_pointers_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
    pub offensive_rebounds: u32,
    pub defensive_rebounds: u32,
    pub total_rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub personal_fouls: u32,
    pub plus_minus: Option<i32>,
    pub recorded_at: DateTime<Utc>,
}

impl GameStatLine {
    /// Checks the box-score consistency rules. The aggregator and the
    /// calculators assume lines have already passed this.
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.minutes_played < Decimal::ZERO || self.minutes_played > MAX_MINUTES_PER_GAME {
            return Err(StatsError::Validation(
                "Minutes played must be between 0 and 48".to_string(),
            ));
        }
        if self.field_goals_made > self.field_goals_attempted {
            return Err(StatsError::Validation(
                "Field goals made cannot exceed field goals attempted".to_string(),
            ));
        }
        if self.three_pointers_made > self.three_pointers_attempted {
            return Err(StatsError::Validation(
                "Three pointers made cannot exceed three pointers attempted".to_string(),
            ));
        }
        if self.three_pointers_made > self.field_goals_made {
            return Err(StatsError::Validation(
                "Three pointers made cannot exceed total field goals made".to_string(),
            ));
        }
        if self.free_throws_made > self.free_throws_attempted {
            return Err(StatsError::Validation(
                "Free throws made cannot exceed free throws attempted".to_string(),
            ));
        }
        if self.offensive_rebounds + self.defensive_rebounds != self.total_rebounds {
            return Err(StatsError::Validation(
                "Total rebounds must equal offensive rebounds plus defensive rebounds".to_string(),
            ));
        }
        if self.personal_fouls > 6 {
            return Err(StatsError::Validation(
                "Personal fouls cannot exceed 6".to_string(),
            ));
        }
        Ok(())
    }
}

/// Materialized sum/average view over a player's game lines for one season.
/// Always re-derivable from the constituent `GameStatLine`s; only the
/// orchestrator writes it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonAggregate {
    pub player_id: Uuid,
    pub season: String,
    pub games_played: u32,
    pub total_minutes: Decimal,
    pub total_points: u32,
    pub total_field_goals_made: u32,
    pub total_field_goals_attempted: u32,
    pub total_three_pointers_made: u32,
    pub total_three_pointers_attempted: u32,
    pub total_free_throws_made: u32,
    pub total_free_throws_attempted: u32,
    pub total_offensive_rebounds: u32,
    pub total_defensive_rebounds: u32,
    pub total_rebounds: u32,
    pub total_assists: u32,
    pub total_steals: u32,
    pub total_blocks: u32,
    pub total_turnovers: u32,
    pub total_personal_fouls: u32,
    pub avg_points: Decimal,
    pub avg_rebounds: Decimal,
    pub avg_assists: Decimal,
    pub avg_minutes: Decimal,
    /// `None` when the attempted count is zero, so consumers can tell
    /// "0%" apart from "no attempts".
    pub field_goal_percentage: Option<Decimal>,
    pub three_point_percentage: Option<Decimal>,
    pub free_throw_percentage: Option<Decimal>,
}

/// A metric that needs team-level context to compute. `Unavailable` marks
/// missing context explicitly instead of substituting a league-average
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum TeamMetric {
    Computed(f64),
    Unavailable,
}

impl TeamMetric {
    pub fn value(&self) -> Option<f64> {
        match self {
            TeamMetric::Computed(v) => Some(*v),
            TeamMetric::Unavailable => None,
        }
    }
}

/// Derived efficiency metrics for one (player, season). A pure projection of
/// the `SeasonAggregate` plus optional team totals; never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedMetrics {
    pub player_id: Uuid,
    pub season: String,
    pub true_shooting_percentage: f64,
    pub effective_field_goal_percentage: f64,
    pub player_efficiency_rating: f64,
    pub offensive_rating: f64,
    pub defensive_rating: f64,
    pub net_rating: f64,
    pub usage_rate: TeamMetric,
    pub assist_percentage: TeamMetric,
    pub turnover_percentage: f64,
    pub points_per36: f64,
    pub rebounds_per36: f64,
    pub assists_per36: f64,
    pub steals_per36: f64,
    pub blocks_per36: f64,
    pub assist_to_turnover_ratio: f64,
}

/// Season totals for a whole team, used by usage rate and assist percentage.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTotals {
    pub team_id: Uuid,
    pub season: String,
    pub total_field_goals_made: u32,
    pub total_field_goals_attempted: u32,
    pub total_free_throws_attempted: u32,
    pub total_turnovers: u32,
    pub total_minutes: Decimal,
}

/// Stat selector for the league-leaders query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LeaderStat {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
}

/// Outcome of a season recompute.
#[derive(Debug, Clone, PartialEq)]
pub enum RecomputeOutcome {
    /// Aggregate and metrics were rebuilt and persisted.
    Updated {
        aggregate: SeasonAggregate,
        metrics: AdvancedMetrics,
    },
    /// No game lines remained; the aggregate and metrics rows were removed.
    Cleared,
}
