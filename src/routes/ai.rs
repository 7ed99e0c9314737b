use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use validator::Validate;

use crate::core::{city_to_coordinate, MatchOptions};
use crate::models::{
    BloodPredictionRequest, BloodPredictionResponse, DonorMatch, EmergencyRequest,
    SmartMatchingRequest, SmartMatchingResponse,
};
use crate::routes::{error_response, matches::run_matching, registry_error_response, AppState};
use crate::services::{LlmError, SETUP_GUIDE};

const MATCHING_SYSTEM_PROMPT: &str = "You are a blood bank coordinator. Rank donor candidates for an \
emergency blood request. Reply with a single JSON object only: \
{\"rankedDonorIds\": [string], \"reasoning\": string}.";

const PREDICTION_SYSTEM_PROMPT: &str = "You are a blood supply analyst. Estimate blood demand for an \
Indian city. Reply with a single JSON object only: {\"predictions\": [{\"bloodType\": string, \
\"expectedUnits\": number, \"shortageRisk\": \"low\"|\"medium\"|\"high\"}], \"summary\": string}.";

/// Configure AI proxy routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/smart-matching", web::post().to(smart_matching))
        .route("/blood-prediction", web::post().to(blood_prediction));
}

fn llm_error_response(err: &LlmError) -> HttpResponse {
    match err {
        LlmError::NotConfigured => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "AI not configured", SETUP_GUIDE)
        }
        LlmError::InvalidJson(detail) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid JSON response from AI model",
            detail.clone(),
        ),
        other => {
            tracing::error!("AI request failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "AI request failed", other.to_string())
        }
    }
}

/// Prompt listing the request and the pre-ranked candidates
fn smart_matching_prompt(request: &EmergencyRequest, matches: &[DonorMatch]) -> String {
    let candidates: Vec<Value> = matches
        .iter()
        .map(|m| {
            json!({
                "donorId": m.donor.id,
                "bloodType": m.donor.blood_type,
                "distanceKm": m.distance_km,
                "isEligible": m.is_eligible,
                "matchScore": m.match_score,
                "lastDonation": m.last_donation.as_ref().map(|d| d.donated_at.to_rfc3339()),
                "locationPrecision": m.location_precision,
            })
        })
        .collect();

    format!(
        "Emergency request: {} unit(s) of {} blood, urgency {:?}, location {}.\n\
         Candidates (already filtered for compatibility and distance):\n{}\n\
         Re-rank the candidates, most suitable first, using only the donorIds above.",
        request.units_required,
        request.blood_type,
        request.urgency,
        request.location.as_deref().unwrap_or("unknown"),
        serde_json::to_string_pretty(&candidates).unwrap_or_default(),
    )
}

/// Reorder matches by the model's `rankedDonorIds`
///
/// Ids the model invented are ignored; candidates it left out keep their
/// original relative order after the ranked ones.
fn apply_ranking(matches: Vec<DonorMatch>, ranking: &Value) -> Vec<DonorMatch> {
    let ranked_ids: Vec<&str> = ranking
        .get("rankedDonorIds")
        .and_then(|ids| ids.as_array())
        .map(|ids| ids.iter().filter_map(|id| id.as_str()).collect())
        .unwrap_or_default();

    let mut remaining = matches;
    let mut ordered = Vec::with_capacity(remaining.len());
    for id in ranked_ids {
        if let Some(pos) = remaining.iter().position(|m| m.donor.id == id) {
            ordered.push(remaining.remove(pos));
        }
    }
    ordered.extend(remaining);
    ordered
}

fn blood_prediction_prompt(
    city: &str,
    blood_type: Option<&str>,
    horizon_days: u16,
    donors: &BTreeMap<String, usize>,
    known_city: bool,
) -> String {
    format!(
        "City: {}{}\nForecast horizon: {} day(s)\nFocus blood type: {}\n\
         Active registered donors by blood type: {}\n\
         Predict expected demand in units per blood type and the shortage risk.",
        city,
        if known_city { "" } else { " (not in our city table)" },
        horizon_days,
        blood_type.unwrap_or("all"),
        serde_json::to_string(donors).unwrap_or_default(),
    )
}

/// AI re-ranking endpoint
///
/// POST /api/ai/smart-matching
///
/// Request body (either `requestId` or `request`):
/// ```json
/// {
///   "requestId": "uuid",
///   "request": { "bloodType": "A+", "location": "Pune" },
///   "limit": 5
/// }
/// ```
async fn smart_matching(
    state: web::Data<AppState>,
    req: web::Json<SmartMatchingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    if !state.llm.is_configured() {
        return llm_error_response(&LlmError::NotConfigured);
    }

    let req = req.into_inner();
    let request = match (req.request_id, req.request) {
        (Some(id), _) => match state.registry.get_request(id).await {
            Ok(request) => request,
            Err(e) => return registry_error_response(&e),
        },
        (None, Some(body)) => body.into_request(),
        (None, None) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                "either requestId or request is required",
            );
        }
    };

    let options = MatchOptions {
        max_distance_km: state.policy.max_distance_km,
        exclude_imprecise: state.policy.exclude_imprecise,
        ..MatchOptions::default()
    };
    let limit = state.policy.limit(Some(req.limit));
    let (result, _) = run_matching(&state, &request, options, limit).await;

    if result.matches.is_empty() {
        return HttpResponse::Ok().json(SmartMatchingResponse {
            matches: vec![],
            ai_ranking: json!({
                "rankedDonorIds": [],
                "reasoning": "No compatible donors within range",
            }),
        });
    }

    let prompt = smart_matching_prompt(&request, &result.matches);
    match state.llm.complete_json(MATCHING_SYSTEM_PROMPT, &prompt).await {
        Ok(ranking) => HttpResponse::Ok().json(SmartMatchingResponse {
            matches: apply_ranking(result.matches, &ranking),
            ai_ranking: ranking,
        }),
        Err(e) => llm_error_response(&e),
    }
}

/// AI demand prediction endpoint
///
/// POST /api/ai/blood-prediction
///
/// Request body:
/// ```json
/// { "city": "Pune", "bloodType": "O-", "horizonDays": 7 }
/// ```
async fn blood_prediction(
    state: web::Data<AppState>,
    req: web::Json<BloodPredictionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    if !state.llm.is_configured() {
        return llm_error_response(&LlmError::NotConfigured);
    }

    let donors = state.registry.active_donors_by_blood_type(&req.city).await;
    let known_city = !city_to_coordinate(&req.city).is_fallback();
    let prompt = blood_prediction_prompt(
        &req.city,
        req.blood_type.as_deref(),
        req.horizon_days,
        &donors,
        known_city,
    );

    match state.llm.complete_json(PREDICTION_SYSTEM_PROMPT, &prompt).await {
        Ok(prediction) => HttpResponse::Ok().json(BloodPredictionResponse {
            city: req.city.clone(),
            prediction,
            generated_at: chrono::Utc::now(),
        }),
        Err(e) => llm_error_response(&e),
    }
}
