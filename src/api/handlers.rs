//! API Request Handlers

use axum::extract::{Json, State};
use std::sync::Arc;
use std::time::Instant;

use super::types::*;
use crate::utils::telemetry::BotStats;

/// Shared application state
pub struct AppState {
    pub stats: Arc<BotStats>,
    pub categories_loaded: usize,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(stats: Arc<BotStats>, categories_loaded: usize) -> Self {
        Self {
            stats,
            categories_loaded,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        categories_loaded: state.categories_loaded,
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        counters: state.stats.snapshot(),
        uptime_seconds: state.uptime_seconds(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
