mod shared;
mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use shared::AppState;
use stats::handlers;
use stats::{InMemoryStatsRepository, StatsService};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoopstats=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting basketball stats server");

    // Dependency injection keeps the store swappable:
    let repository = Arc::new(InMemoryStatsRepository::new());

    // For production with PostgreSQL, connect a pool and plug a Postgres
    // implementation of StatsRepository in behind the same trait:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");

    let stats_service = Arc::new(StatsService::new(repository));
    let app_state = AppState::new(stats_service);

    let app = Router::new()
        .route("/api/stats/game", post(handlers::record_game_stats))
        .route(
            "/api/stats/player/:player_id/game/:game_id",
            get(handlers::get_player_game_stats).delete(handlers::delete_game_stats),
        )
        .route(
            "/api/stats/player/:player_id/season/:season",
            get(handlers::get_player_season_stats),
        )
        .route(
            "/api/stats/advanced/:player_id/:season",
            get(handlers::get_advanced_metrics),
        )
        .route(
            "/api/stats/leaders/:season",
            get(handlers::get_league_leaders),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
