use std::sync::Arc;

use chrono::Utc;
use hoopstats::{GameStatLine, InMemoryStatsRepository, StatsService};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Service + repository pair wired the way `main` wires them.
pub struct TestSetup {
    pub repository: Arc<InMemoryStatsRepository>,
    pub service: StatsService,
}

impl TestSetup {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let service = StatsService::new(repository.clone());
        Self {
            repository,
            service,
        }
    }
}

/// Builds valid stat lines with sensible defaults so tests only spell out
/// the fields they care about.
pub struct StatLineBuilder {
    line: GameStatLine,
}

impl StatLineBuilder {
    pub fn new(player_id: Uuid) -> Self {
        Self {
            line: GameStatLine {
                player_id,
                game_id: Uuid::new_v4(),
                minutes_played: dec!(30),
                points: 18,
                field_goals_made: 7,
                field_goals_attempted: 14,
                three_pointers_made: 1,
                three_pointers_attempted: 4,
                free_throws_made: 3,
                free_throws_attempted: 4,
                offensive_rebounds: 2,
                defensive_rebounds: 4,
                total_rebounds: 6,
                assists: 4,
                steals: 1,
                blocks: 1,
                turnovers: 2,
                personal_fouls: 2,
                plus_minus: None,
                recorded_at: Utc::now(),
            },
        }
    }

    pub fn game_id(mut self, game_id: Uuid) -> Self {
        self.line.game_id = game_id;
        self
    }

    pub fn minutes(mut self, minutes: Decimal) -> Self {
        self.line.minutes_played = minutes;
        self
    }

    pub fn points(mut self, points: u32) -> Self {
        self.line.points = points;
        self
    }

    pub fn shooting(mut self, fgm: u32, fga: u32, three_pm: u32, three_pa: u32) -> Self {
        self.line.field_goals_made = fgm;
        self.line.field_goals_attempted = fga;
        self.line.three_pointers_made = three_pm;
        self.line.three_pointers_attempted = three_pa;
        self
    }

    pub fn free_throws(mut self, ftm: u32, fta: u32) -> Self {
        self.line.free_throws_made = ftm;
        self.line.free_throws_attempted = fta;
        self
    }

    pub fn build(self) -> GameStatLine {
        self.line
    }
}
