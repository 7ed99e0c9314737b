use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::core::{MatchOptions, MatchResult};
use crate::models::{
    EmergencyRequest, EmergencyRequestBody, FindMatchesRequest, FindMatchesResponse, HealthResponse,
    MatchesQuery,
};
use crate::routes::{error_response, registry_error_response, AppState};
use crate::services::CacheKey;

/// Configure health, request and matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/requests", web::post().to(create_request))
        .route("/requests/{id}/matches", web::get().to(request_matches))
        .route("/matches/find", web::post().to(find_matches));
}

/// Run the matcher against the current registry snapshot
///
/// Also returns the registry generation the snapshot was taken at.
pub(crate) async fn run_matching(
    state: &AppState,
    request: &EmergencyRequest,
    options: MatchOptions,
    limit: usize,
) -> (MatchResult, u64) {
    let snapshot = state.registry.snapshot().await;
    let mut result = state
        .matcher
        .find_matches(&snapshot.donors, &snapshot.donations, request, &options);
    result.truncate(limit);
    (result, snapshot.generation)
}

fn invalid_distance_response() -> HttpResponse {
    error_response(
        StatusCode::BAD_REQUEST,
        "Validation failed",
        "maxDistanceKm must be a finite number",
    )
}

fn to_response(result: MatchResult, request: &EmergencyRequest) -> FindMatchesResponse {
    FindMatchesResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
        compatible_candidates: result.compatible_candidates,
        imprecise_locations: result.imprecise_locations,
        units_required: request.units_required,
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let counts = state.registry.counts().await;
    let status = if state.llm.is_configured() { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        donors: counts.donors,
        donations: counts.donations,
        requests: counts.requests,
        cached_matches: state.cache.stats().entries,
    })
}

/// Create emergency request endpoint
///
/// POST /api/v1/requests
///
/// Request body:
/// ```json
/// {
///   "bloodType": "A+",
///   "unitsRequired": 2,
///   "urgency": "low|medium|high|critical",
///   "location": "Mumbai",
///   "latitude": 19.07,
///   "longitude": 72.87
/// }
/// ```
async fn create_request(
    state: web::Data<AppState>,
    req: web::Json<EmergencyRequestBody>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create_request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let request = state.registry.create_request(req.into_inner().into_request()).await;
    HttpResponse::Created().json(request)
}

/// Ranked matches for a stored request
///
/// GET /api/v1/requests/{id}/matches?limit=10&maxDistanceKm=50
async fn request_matches(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<MatchesQuery>,
) -> impl Responder {
    let request_id = path.into_inner();
    let request = match state.registry.get_request(request_id).await {
        Ok(request) => request,
        Err(e) => return registry_error_response(&e),
    };

    let limit = state.policy.limit(query.limit);
    let Some(max_distance_km) = state.policy.max_distance(query.max_distance_km) else {
        return invalid_distance_response();
    };

    let generation = state.registry.generation().await;
    let cache_key = CacheKey::matches(request_id, generation, limit, max_distance_km);
    if let Ok(cached) = state.cache.get::<FindMatchesResponse>(&cache_key).await {
        return HttpResponse::Ok().json(cached);
    }

    let options = MatchOptions {
        max_distance_km,
        exclude_imprecise: state.policy.exclude_imprecise,
        ..MatchOptions::default()
    };
    let (result, snapshot_generation) = run_matching(&state, &request, options, limit).await;
    let response = to_response(result, &request);

    // Keyed by the generation actually matched against, so a write that
    // lands mid-request can never leave this ranking reachable.
    let cache_key = CacheKey::matches(request_id, snapshot_generation, limit, max_distance_km);
    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache matches for {}: {}", request_id, e);
    }

    tracing::info!(
        "Returning {} matches for request {} (from {} donors)",
        response.matches.len(),
        request_id,
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

/// Ad hoc matching endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "request": { "bloodType": "A+", "location": "Pune" },
///   "maxDistanceKm": 50,
///   "limit": 10,
///   "excludeImprecise": false,
///   "jitterSeed": 7
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let limit = state.policy.limit(req.limit);
    let Some(max_distance_km) = state.policy.max_distance(req.max_distance_km) else {
        return invalid_distance_response();
    };
    let options = MatchOptions {
        max_distance_km,
        exclude_imprecise: req.exclude_imprecise || state.policy.exclude_imprecise,
        jitter_seed: req.jitter_seed,
        ..MatchOptions::default()
    };
    let request = req.request.into_request();

    let (result, _) = run_matching(&state, &request, options, limit).await;

    tracing::info!(
        "Returning {} ad hoc matches for {} (from {} donors)",
        result.matches.len(),
        request.blood_type,
        result.total_candidates
    );

    HttpResponse::Ok().json(to_response(result, &request))
}
