use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::shared::{AppError, AppState};

use super::models::{AdvancedMetrics, GameStatLine, LeaderStat, SeasonAggregate};

/// Payload for recording one player's box score. The season rides along in
/// the payload since the stats core does not store game entities.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordGameStatsRequest {
    pub season: String,
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
}

impl RecordGameStatsRequest {
    fn into_line(self) -> (String, GameStatLine) {
        let line = GameStatLine {
            player_id: self.player_id,
            game_id: self.game_id,
            minutes_played: self.minutes_played,
            points: self.points,
            field_goals_made: self.field_goals_made,
            field_goals_attempted: self.field_goals_attempted,
            three_pointers_made: self.three_pointers_made,
            three_pointers_attempted: self.three_pointers_attempted,
            free_throws_made: self.free_throws_made,
            free_throws_attempted: self.free_throws_attempted,
            offensive_rebounds: self.offensive_rebounds,
            defensive_rebounds: self.defensive_rebounds,
            total_rebounds: self.total_rebounds,
            assists: self.assists,
            steals: self.steals,
            blocks: self.blocks,
            turnovers: self.turnovers,
            personal_fouls: self.personal_fouls,
            plus_minus: self.plus_minus,
            recorded_at: Utc::now(),
        };
        (self.season, line)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeasonStatsResponse {
    pub season_stats: Option<SeasonAggregate>,
    pub advanced_metrics: Option<AdvancedMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct LeadersQuery {
    pub stat: Option<String>,
    pub limit: Option<usize>,
}

/// POST /api/stats/game
pub async fn record_game_stats(
    State(state): State<AppState>,
    Json(request): Json<RecordGameStatsRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (season, line) = request.into_line();
    state.stats_service.record_game_stats(&season, line).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Game statistics recorded successfully" })),
    ))
}

/// GET /api/stats/player/{player_id}/game/{game_id}
pub async fn get_player_game_stats(
    State(state): State<AppState>,
    Path((player_id, game_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GameStatLine>, AppError> {
    let line = state
        .stats_service
        .get_player_game_stats(player_id, game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game statistics not found".to_string()))?;
    Ok(Json(line))
}

/// DELETE /api/stats/player/{player_id}/game/{game_id}
pub async fn delete_game_stats(
    State(state): State<AppState>,
    Path((player_id, game_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .stats_service
        .delete_game_stats(player_id, game_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stats/player/{player_id}/season/{season}
pub async fn get_player_season_stats(
    State(state): State<AppState>,
    Path((player_id, season)): Path<(Uuid, String)>,
) -> Result<Json<PlayerSeasonStatsResponse>, AppError> {
    let (season_stats, advanced_metrics) = state
        .stats_service
        .get_player_season_stats(player_id, &season)
        .await?;
    Ok(Json(PlayerSeasonStatsResponse {
        season_stats,
        advanced_metrics,
    }))
}

/// GET /api/stats/advanced/{player_id}/{season}
pub async fn get_advanced_metrics(
    State(state): State<AppState>,
    Path((player_id, season)): Path<(Uuid, String)>,
) -> Result<Json<AdvancedMetrics>, AppError> {
    let metrics = state
        .stats_service
        .get_advanced_metrics(player_id, &season)
        .await?
        .ok_or_else(|| AppError::NotFound("Advanced metrics not found".to_string()))?;
    Ok(Json(metrics))
}

/// GET /api/stats/leaders/{season}?stat=points&limit=10
pub async fn get_league_leaders(
    State(state): State<AppState>,
    Path(season): Path<String>,
    Query(query): Query<LeadersQuery>,
) -> Result<Json<Vec<SeasonAggregate>>, AppError> {
    let stat_name = query.stat.as_deref().unwrap_or("points");
    let stat: LeaderStat = stat_name.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "Invalid stat parameter: {stat_name}. Stat must be one of: points, rebounds, assists, steals, blocks"
        ))
    })?;
    let limit = query.limit.unwrap_or(10);

    let leaders = state
        .stats_service
        .league_leaders(&season, stat, limit)
        .await?;
    Ok(Json(leaders))
}
