//! API Response Types

use serde::Serialize;

use crate::utils::telemetry::StatsSnapshot;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

// ============================================
// Health & Stats
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub categories_loaded: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    pub uptime_seconds: u64,
    pub api_version: String,
}
