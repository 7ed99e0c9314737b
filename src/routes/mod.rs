// Route exports
pub mod ai;
pub mod donors;
pub mod matches;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;

use crate::config::MatchingSettings;
use crate::core::{Matcher, DEFAULT_MAX_DISTANCE_KM};
use crate::models::ErrorResponse;
use crate::services::{CacheManager, LlmClient, Registry, RegistryError};

/// Server-side bounds applied to every matching call
#[derive(Debug, Clone, Copy)]
pub struct MatchingPolicy {
    pub max_distance_km: f64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub exclude_imprecise: bool,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            default_limit: 10,
            max_limit: 100,
            exclude_imprecise: false,
        }
    }
}

impl From<&MatchingSettings> for MatchingPolicy {
    fn from(settings: &MatchingSettings) -> Self {
        let defaults = Self::default();
        Self {
            max_distance_km: settings.max_distance_km.unwrap_or(defaults.max_distance_km),
            default_limit: settings.default_limit.map(usize::from).unwrap_or(defaults.default_limit),
            max_limit: settings.max_limit.map(usize::from).unwrap_or(defaults.max_limit),
            exclude_imprecise: settings.exclude_imprecise.unwrap_or(defaults.exclude_imprecise),
        }
    }
}

impl MatchingPolicy {
    /// Requested limit, defaulted and capped
    pub fn limit(&self, requested: Option<u16>) -> usize {
        requested
            .map(usize::from)
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }

    /// Requested search radius, defaulted and capped at the configured maximum
    ///
    /// Returns `None` for NaN or infinite input.
    pub fn max_distance(&self, requested: Option<f64>) -> Option<f64> {
        let requested = requested.unwrap_or(self.max_distance_km);
        if !requested.is_finite() {
            return None;
        }
        Some(requested.clamp(0.0, self.max_distance_km.max(1.0)))
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub cache: Arc<CacheManager>,
    pub llm: Arc<LlmClient>,
    pub matcher: Matcher,
    pub policy: MatchingPolicy,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(donors::configure)
            .configure(matches::configure),
    )
    .service(web::scope("/api/ai").configure(ai::configure));
}

/// Build a JSON error body with the given status
pub(crate) fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn registry_error_response(err: &RegistryError) -> HttpResponse {
    let (status, error) = match err {
        RegistryError::DonorNotFound(_) => (StatusCode::NOT_FOUND, "Donor not found"),
        RegistryError::DonationNotFound(_) => (StatusCode::NOT_FOUND, "Donation not found"),
        RegistryError::RequestNotFound(_) => (StatusCode::NOT_FOUND, "Request not found"),
        RegistryError::DuplicateDonor(_) => (StatusCode::CONFLICT, "Donor already registered"),
        RegistryError::InvalidStatusTransition { .. } => (StatusCode::CONFLICT, "Invalid status transition"),
    };
    error_response(status, error, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_limit_bounds() {
        let policy = MatchingPolicy::default();
        assert_eq!(policy.limit(None), 10);
        assert_eq!(policy.limit(Some(0)), 1);
        assert_eq!(policy.limit(Some(500)), 100);
    }

    #[test]
    fn test_policy_distance_bounds() {
        let policy = MatchingPolicy::default();
        assert_eq!(policy.max_distance(None), Some(50.0));
        assert_eq!(policy.max_distance(Some(20.0)), Some(20.0));
        assert_eq!(policy.max_distance(Some(500.0)), Some(50.0));
        assert_eq!(policy.max_distance(Some(-3.0)), Some(0.0));
        assert_eq!(policy.max_distance(Some(f64::NAN)), None);
        assert_eq!(policy.max_distance(Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_policy_from_settings() {
        let settings = MatchingSettings {
            max_distance_km: Some(25.0),
            default_limit: None,
            max_limit: Some(20),
            exclude_imprecise: Some(true),
        };
        let policy = MatchingPolicy::from(&settings);
        assert_eq!(policy.max_distance_km, 25.0);
        assert_eq!(policy.default_limit, 10);
        assert_eq!(policy.max_limit, 20);
        assert!(policy.exclude_imprecise);
    }
}
