use rust_decimal::prelude::ToPrimitive;

use super::models::{AdvancedMetrics, SeasonAggregate, TeamMetric, TeamTotals};

/// League-average defensive rating used as the DRtg baseline.
const DRTG_BASELINE: f64 = 110.0;
/// Elite-defense floor for the simplified DRtg.
const DRTG_FLOOR: f64 = 85.0;
/// Free-throw possession weight used throughout the possession estimates.
const FTA_POSSESSION_WEIGHT: f64 = 0.44;

/// A box-score-shaped record in f64 form. Season-level PER/ORtg/DRtg are
/// computed from a synthetic "average game" built by dividing season totals
/// by games played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageGame {
    pub minutes_played: f64,
    pub points: f64,
    pub field_goals_made: f64,
    pub field_goals_attempted: f64,
    pub three_pointers_made: f64,
    pub free_throws_made: f64,
    pub free_throws_attempted: f64,
    pub defensive_rebounds: f64,
    pub total_rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
}

impl AverageGame {
    /// Derives the per-game line from a season aggregate, rounding each
    /// counting stat to the nearest integer.
    pub fn from_aggregate(aggregate: &SeasonAggregate) -> Self {
        let games = f64::from(aggregate.games_played.max(1));
        let per_game = |total: u32| (f64::from(total) / games).round();
        Self {
            minutes_played: aggregate.avg_minutes.to_f64().unwrap_or(0.0),
            points: per_game(aggregate.total_points),
            field_goals_made: per_game(aggregate.total_field_goals_made),
            field_goals_attempted: per_game(aggregate.total_field_goals_attempted),
            three_pointers_made: per_game(aggregate.total_three_pointers_made),
            free_throws_made: per_game(aggregate.total_free_throws_made),
            free_throws_attempted: per_game(aggregate.total_free_throws_attempted),
            defensive_rebounds: per_game(aggregate.total_defensive_rebounds),
            total_rebounds: per_game(aggregate.total_rebounds),
            assists: per_game(aggregate.total_assists),
            steals: per_game(aggregate.total_steals),
            blocks: per_game(aggregate.total_blocks),
            turnovers: per_game(aggregate.total_turnovers),
        }
    }
}

/// TS% = PTS / (2 * (FGA + 0.44 * FTA)). Returns 0 when nothing was attempted.
pub fn true_shooting_percentage(points: f64, fga: f64, fta: f64) -> f64 {
    let denominator = 2.0 * (fga + FTA_POSSESSION_WEIGHT * fta);
    if denominator == 0.0 {
        return 0.0;
    }
    points / denominator
}

/// eFG% = (FGM + 0.5 * 3PM) / FGA. Returns 0 when FGA is 0.
pub fn effective_field_goal_percentage(fgm: f64, three_pm: f64, fga: f64) -> f64 {
    if fga == 0.0 {
        return 0.0;
    }
    (fgm + 0.5 * three_pm) / fga
}

/// USG% = 100 * ((FGA + 0.44 * FTA + TOV) * (Tm MP / 5)) / (MP * team plays).
/// Returns 0 when the player or team logged no minutes or the team used no
/// plays.
pub fn usage_rate(
    player_fga: f64,
    player_fta: f64,
    player_turnovers: f64,
    player_minutes: f64,
    team: &TeamTotals,
) -> f64 {
    let team_minutes = team.total_minutes.to_f64().unwrap_or(0.0);
    if player_minutes == 0.0 || team_minutes == 0.0 {
        return 0.0;
    }

    let player_plays = player_fga + FTA_POSSESSION_WEIGHT * player_fta + player_turnovers;
    let team_plays = f64::from(team.total_field_goals_attempted)
        + FTA_POSSESSION_WEIGHT * f64::from(team.total_free_throws_attempted)
        + f64::from(team.total_turnovers);
    if team_plays == 0.0 {
        return 0.0;
    }

    (100.0 * player_plays * (team_minutes / 5.0)) / (player_minutes * team_plays)
}

/// AST% = 100 * AST / (((MP / (Tm MP / 5)) * Tm FGM) - FGM). Returns 0 when
/// minutes are missing or no teammate field goals were available to assist.
pub fn assist_percentage(
    assists: f64,
    player_minutes: f64,
    player_fgm: f64,
    team: &TeamTotals,
) -> f64 {
    let team_minutes = team.total_minutes.to_f64().unwrap_or(0.0);
    if player_minutes == 0.0 || team_minutes == 0.0 {
        return 0.0;
    }

    let possible_assists =
        (player_minutes / (team_minutes / 5.0)) * f64::from(team.total_field_goals_made)
            - player_fgm;
    if possible_assists == 0.0 {
        return 0.0;
    }

    (100.0 * assists) / possible_assists
}

/// TOV% = 100 * TOV / (FGA + 0.44 * FTA + TOV). Returns 0 when no plays
/// were used.
pub fn turnover_percentage(turnovers: f64, fga: f64, fta: f64) -> f64 {
    let plays = fga + FTA_POSSESSION_WEIGHT * fta + turnovers;
    if plays == 0.0 {
        return 0.0;
    }
    (100.0 * turnovers) / plays
}

/// Normalizes a counting stat to a 36-minute game. Returns 0 for 0 minutes.
pub fn per36(stat: f64, minutes_played: f64) -> f64 {
    if minutes_played == 0.0 {
        return 0.0;
    }
    (stat * 36.0) / minutes_played
}

/// Simplified PER: (positive box-score actions - negative actions) per
/// minute, scaled by 15 and floored at 0. The full PER needs league averages
/// and pace, which are out of scope.
pub fn simplified_per(game: &AverageGame) -> f64 {
    if game.minutes_played == 0.0 {
        return 0.0;
    }

    let positive_actions =
        game.points + game.total_rebounds + game.assists + game.steals + game.blocks;
    let negative_actions = game.field_goals_attempted - game.field_goals_made
        + game.free_throws_attempted
        - game.free_throws_made
        + game.turnovers;

    let per = ((positive_actions - negative_actions) / game.minutes_played) * 15.0;
    per.max(0.0)
}

/// Simplified ORtg: points produced (scoring plus assist contribution) per
/// 100 possessions used. Returns 0 when no possessions were used.
pub fn offensive_rating(game: &AverageGame) -> f64 {
    let possessions = game.field_goals_attempted
        + FTA_POSSESSION_WEIGHT * game.free_throws_attempted
        + game.turnovers;
    if possessions == 0.0 {
        return 0.0;
    }

    let points_produced = game.points + 2.0 * game.assists;
    (points_produced / possessions) * 100.0
}

/// Simplified DRtg: the 110 baseline reduced by 20 per defensive stop per
/// minute, floored at 85. Defaults to the baseline when minutes are 0.
pub fn defensive_rating(game: &AverageGame) -> f64 {
    if game.minutes_played == 0.0 {
        return DRTG_BASELINE;
    }

    let defensive_stops = game.defensive_rebounds + game.steals + game.blocks;
    let adjustment = (defensive_stops / game.minutes_played) * 20.0;
    (DRTG_BASELINE - adjustment).max(DRTG_FLOOR)
}

/// AST/TOV ratio. With no turnovers the ratio is the assist count itself
/// rather than infinity.
pub fn assist_to_turnover_ratio(assists: f64, turnovers: f64) -> f64 {
    if turnovers == 0.0 {
        return assists;
    }
    assists / turnovers
}

/// Computes the full `AdvancedMetrics` projection of a season aggregate.
///
/// Shooting efficiency, turnover percentage, per-36 stats, and the
/// assist/turnover ratio come straight from season totals; PER, ORtg, and
/// DRtg are approximated from the synthetic average game. Usage rate and
/// assist percentage need team totals and come back `Unavailable` when that
/// context is missing.
pub fn season_advanced_metrics(
    aggregate: &SeasonAggregate,
    team_totals: Option<&TeamTotals>,
) -> AdvancedMetrics {
    let total_minutes = aggregate.total_minutes.to_f64().unwrap_or(0.0);
    let total_points = f64::from(aggregate.total_points);
    let total_fgm = f64::from(aggregate.total_field_goals_made);
    let total_fga = f64::from(aggregate.total_field_goals_attempted);
    let total_three_pm = f64::from(aggregate.total_three_pointers_made);
    let total_fta = f64::from(aggregate.total_free_throws_attempted);
    let total_rebounds = f64::from(aggregate.total_rebounds);
    let total_assists = f64::from(aggregate.total_assists);
    let total_steals = f64::from(aggregate.total_steals);
    let total_blocks = f64::from(aggregate.total_blocks);
    let total_turnovers = f64::from(aggregate.total_turnovers);

    let average_game = AverageGame::from_aggregate(aggregate);
    let ortg = offensive_rating(&average_game);
    let drtg = defensive_rating(&average_game);

    let usage = match team_totals {
        Some(team) => TeamMetric::Computed(usage_rate(
            total_fga,
            total_fta,
            total_turnovers,
            total_minutes,
            team,
        )),
        None => TeamMetric::Unavailable,
    };
    let assist_pct = match team_totals {
        Some(team) => TeamMetric::Computed(assist_percentage(
            total_assists,
            total_minutes,
            total_fgm,
            team,
        )),
        None => TeamMetric::Unavailable,
    };

    AdvancedMetrics {
        player_id: aggregate.player_id,
        season: aggregate.season.clone(),
        true_shooting_percentage: true_shooting_percentage(total_points, total_fga, total_fta),
        effective_field_goal_percentage: effective_field_goal_percentage(
            total_fgm,
            total_three_pm,
            total_fga,
        ),
        player_efficiency_rating: simplified_per(&average_game),
        offensive_rating: ortg,
        defensive_rating: drtg,
        net_rating: ortg - drtg,
        usage_rate: usage,
        assist_percentage: assist_pct,
        turnover_percentage: turnover_percentage(total_turnovers, total_fga, total_fta),
        points_per36: per36(total_points, total_minutes),
        rebounds_per36: per36(total_rebounds, total_minutes),
        assists_per36: per36(total_assists, total_minutes),
        steals_per36: per36(total_steals, total_minutes),
        blocks_per36: per36(total_blocks, total_minutes),
        assist_to_turnover_ratio: assist_to_turnover_ratio(total_assists, total_turnovers),
    }
}
