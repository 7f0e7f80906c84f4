use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::stats::{StatsError, StatsService};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub stats_service: Arc<StatsService>,
}

impl AppState {
    pub fn new(stats_service: Arc<StatsService>) -> Self {
        Self { stats_service }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Stats(err) => match err {
                StatsError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                StatsError::SeasonNotFound { .. } | StatsError::GameStatsNotFound { .. } => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                StatsError::Store(_) | StatsError::MetricsStale { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
            },
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
