use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    DonationRecord, DonationStatus, Donor, RecordDonationRequest, RegisterDonorRequest,
    UpdateDonationStatusRequest, UpdateDonorRequest,
};
use crate::routes::{error_response, registry_error_response, AppState};

/// Configure donor and donation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/donors", web::post().to(register_donor))
        .route("/donors", web::get().to(list_donors))
        .route("/donors/{id}", web::get().to(get_donor))
        .route("/donors/{id}", web::patch().to(update_donor))
        .route("/donors/{id}/donations", web::get().to(donation_history))
        .route("/donations", web::post().to(record_donation))
        .route("/donations/{id}/status", web::patch().to(update_donation_status));
}

/// Register donor endpoint
///
/// POST /api/v1/donors
///
/// Request body:
/// ```json
/// {
///   "id": "string",
///   "name": "string",
///   "bloodType": "O-",
///   "city": "Pune",
///   "latitude": 18.52,
///   "longitude": 73.85
/// }
/// ```
async fn register_donor(
    state: web::Data<AppState>,
    req: web::Json<RegisterDonorRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for register_donor request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let donor = Donor {
        id: req.id,
        name: req.name,
        blood_type: req.blood_type,
        city: req.city,
        latitude: req.latitude,
        longitude: req.longitude,
        is_active: req.is_active,
        phone: req.phone,
        registered_at: Utc::now(),
    };

    match state.registry.register_donor(donor).await {
        Ok(donor) => {
            state.cache.invalidate_all();
            tracing::info!("Registered donor {} ({})", donor.id, donor.blood_type);
            HttpResponse::Created().json(donor)
        }
        Err(e) => registry_error_response(&e),
    }
}

/// All registered donors, ordered by id
///
/// GET /api/v1/donors
async fn list_donors(state: web::Data<AppState>) -> impl Responder {
    let donors = state.registry.list_donors().await;
    HttpResponse::Ok().json(serde_json::json!({
        "donors": donors,
        "count": donors.len(),
    }))
}

async fn get_donor(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.registry.get_donor(&path).await {
        Ok(donor) => HttpResponse::Ok().json(donor),
        Err(e) => registry_error_response(&e),
    }
}

/// Update donor activity or location
///
/// PATCH /api/v1/donors/{id}
async fn update_donor(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateDonorRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    match state.registry.update_donor(&path, &req).await {
        Ok(donor) => {
            state.cache.invalidate_all();
            HttpResponse::Ok().json(donor)
        }
        Err(e) => registry_error_response(&e),
    }
}

/// Donation history for a donor, newest first
///
/// GET /api/v1/donors/{id}/donations
async fn donation_history(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.registry.donation_history(&path).await {
        Ok(history) => HttpResponse::Ok().json(serde_json::json!({
            "donorId": path.as_str(),
            "donations": history,
            "nextEligibleAt": history.first().map(|d| d.next_eligible_at()),
        })),
        Err(e) => registry_error_response(&e),
    }
}

/// Record donation endpoint
///
/// POST /api/v1/donations
///
/// Request body:
/// ```json
/// {
///   "donorId": "string",
///   "donatedAt": "2024-05-01T10:00:00Z",
///   "donationType": "bridge|voluntary|emergency",
///   "status": "pending|complete|rejected"
/// }
/// ```
async fn record_donation(
    state: web::Data<AppState>,
    req: web::Json<RecordDonationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let mut record = DonationRecord::new(
        req.donor_id,
        req.donated_at.unwrap_or_else(Utc::now),
        req.donation_type,
    );
    record.status = req.status.unwrap_or(DonationStatus::Pending);

    match state.registry.record_donation(record).await {
        Ok(record) => {
            state.cache.invalidate_all();
            HttpResponse::Created().json(serde_json::json!({
                "donation": record,
                "nextEligibleAt": record.next_eligible_at(),
            }))
        }
        Err(e) => registry_error_response(&e),
    }
}

/// Donation status transition
///
/// PATCH /api/v1/donations/{id}/status
async fn update_donation_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<UpdateDonationStatusRequest>,
) -> impl Responder {
    match state
        .registry
        .update_donation_status(path.into_inner(), req.status)
        .await
    {
        Ok(record) => {
            state.cache.invalidate_all();
            HttpResponse::Ok().json(record)
        }
        Err(e) => registry_error_response(&e),
    }
}
