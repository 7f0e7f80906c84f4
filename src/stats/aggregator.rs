use rust_decimal::Decimal;
use uuid::Uuid;

use super::models::{GameStatLine, SeasonAggregate};

/// Reduces a player's game lines for one season into a `SeasonAggregate`.
///
/// Order-insensitive commutative reduction: totals are plain sums, averages
/// are total / games played, shooting percentages are made / attempted and
/// `None` when nothing was attempted. Minutes are summed as `Decimal` so a
/// long season does not accumulate float error. Returns `None` for an empty
/// input; deciding what to do with the prior aggregate is the caller's job.
pub fn aggregate_season(
    player_id: Uuid,
    season: &str,
    lines: &[GameStatLine],
) -> Option<SeasonAggregate> {
    if lines.is_empty() {
        return None;
    }

    let games_played = lines.len() as u32;
    let mut total_minutes = Decimal::ZERO;
    let mut total_points = 0u32;
    let mut total_field_goals_made = 0u32;
    let mut total_field_goals_attempted = 0u32;
    let mut total_three_pointers_made = 0u32;
    let mut total_three_pointers_attempted = 0u32;
    let mut total_free_throws_made = 0u32;
    let mut total_free_throws_attempted = 0u32;
    let mut total_offensive_rebounds = 0u32;
    let mut total_defensive_rebounds = 0u32;
    let mut total_rebounds = 0u32;
    let mut total_assists = 0u32;
    let mut total_steals = 0u32;
    let mut total_blocks = 0u32;
    let mut total_turnovers = 0u32;
    let mut total_personal_fouls = 0u32;

    for line in lines {
        total_minutes += line.minutes_played;
        total_points += line.points;
        total_field_goals_made += line.field_goals_made;
        total_field_goals_attempted += line.field_goals_attempted;
        total_three_pointers_made += line.three_pointers_made;
        total_three_pointers_attempted += line.three_pointers_attempted;
        total_free_throws_made += line.free_throws_made;
        total_free_throws_attempted += line.free_throws_attempted;
        total_offensive_rebounds += line.offensive_rebounds;
        total_defensive_rebounds += line.defensive_rebounds;
        total_rebounds += line.total_rebounds;
        total_assists += line.assists;
        total_steals += line.steals;
        total_blocks += line.blocks;
        total_turnovers += line.turnovers;
        total_personal_fouls += line.personal_fouls;
    }

    let games = Decimal::from(games_played);

    Some(SeasonAggregate {
        player_id,
        season: season.to_string(),
        games_played,
        total_minutes,
        total_points,
        total_field_goals_made,
        total_field_goals_attempted,
        total_three_pointers_made,
        total_three_pointers_attempted,
        total_free_throws_made,
        total_free_throws_attempted,
        total_offensive_rebounds,
        total_defensive_rebounds,
        total_rebounds,
        total_assists,
        total_steals,
        total_blocks,
        total_turnovers,
        total_personal_fouls,
        avg_points: Decimal::from(total_points) / games,
        avg_rebounds: Decimal::from(total_rebounds) / games,
        avg_assists: Decimal::from(total_assists) / games,
        avg_minutes: total_minutes / games,
        field_goal_percentage: shooting_percentage(
            total_field_goals_made,
            total_field_goals_attempted,
        ),
        three_point_percentage: shooting_percentage(
            total_three_pointers_made,
            total_three_pointers_attempted,
        ),
        free_throw_percentage: shooting_percentage(
            total_free_throws_made,
            total_free_throws_attempted,
        ),
    })
}

fn shooting_percentage(made: u32, attempted: u32) -> Option<Decimal> {
    if attempted == 0 {
        return None;
    }
    Some(Decimal::from(made) / Decimal::from(attempted))
}
