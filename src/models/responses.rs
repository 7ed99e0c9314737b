use serde::{Deserialize, Serialize};
use crate::models::domain::DonorMatch;

/// Response for the matching endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub matches: Vec<DonorMatch>,
    pub total_candidates: usize,
    pub compatible_candidates: usize,
    pub imprecise_locations: usize,
    pub units_required: u32,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub donors: usize,
    pub donations: usize,
    pub requests: usize,
    pub cached_matches: u64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Matches plus the model's re-ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartMatchingResponse {
    pub matches: Vec<DonorMatch>,
    pub ai_ranking: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPredictionResponse {
    pub city: String,
    pub prediction: serde_json::Value,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
