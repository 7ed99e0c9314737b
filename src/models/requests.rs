use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::domain::{BloodType, DonationStatus, DonationType, EmergencyRequest, Urgency};

fn validate_blood_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<BloodType>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("blood_type"))
}

/// Latitude and longitude travel together, and must be real numbers
fn validate_coordinate_pair(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), ValidationError> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Ok(()),
        (Some(_), Some(_)) => Err(ValidationError::new("coordinate_not_finite")),
        _ => Err(ValidationError::new("coordinate_pair")),
    }
}

fn validate_register_coordinates(req: &RegisterDonorRequest) -> Result<(), ValidationError> {
    validate_coordinate_pair(req.latitude, req.longitude)
}

fn validate_update_coordinates(req: &UpdateDonorRequest) -> Result<(), ValidationError> {
    validate_coordinate_pair(req.latitude, req.longitude)
}

fn validate_request_coordinates(req: &EmergencyRequestBody) -> Result<(), ValidationError> {
    validate_coordinate_pair(req.latitude, req.longitude)
}

/// Request to register a donor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_register_coordinates"))]
pub struct RegisterDonorRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(custom(function = "validate_blood_type"))]
    pub blood_type: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update of a donor's mutable fields
///
/// A coordinate is replaced as a whole: both halves or neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_coordinates"))]
pub struct UpdateDonorRequest {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Request to record a donation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordDonationRequest {
    #[validate(length(min = 1))]
    pub donor_id: String,
    /// Defaults to now
    #[serde(default)]
    pub donated_at: Option<DateTime<Utc>>,
    pub donation_type: DonationType,
    /// Defaults to pending
    #[serde(default)]
    pub status: Option<DonationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDonationStatusRequest {
    pub status: DonationStatus,
}

/// Body describing an emergency request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_request_coordinates"))]
pub struct EmergencyRequestBody {
    #[validate(custom(function = "validate_blood_type"))]
    pub blood_type: String,
    #[serde(default = "default_units")]
    #[validate(range(min = 1, max = 100))]
    pub units_required: u32,
    #[serde(default = "default_urgency")]
    pub urgency: Urgency,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

fn default_units() -> u32 {
    1
}

fn default_urgency() -> Urgency {
    Urgency::Medium
}

impl EmergencyRequestBody {
    pub fn into_request(self) -> EmergencyRequest {
        EmergencyRequest {
            id: Uuid::new_v4(),
            blood_type: self.blood_type,
            units_required: self.units_required,
            urgency: self.urgency,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: Utc::now(),
        }
    }
}

/// Ad hoc matching for a request that is not stored
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    #[validate(nested)]
    pub request: EmergencyRequestBody,
    #[serde(default)]
    #[validate(range(min = 1.0, max = 500.0))]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    pub exclude_imprecise: bool,
    #[serde(default)]
    pub jitter_seed: Option<u64>,
}

/// Query string for stored-request matching
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesQuery {
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    pub max_distance_km: Option<f64>,
}

/// AI re-ranking of matches, for a stored or inline request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SmartMatchingRequest {
    #[serde(default)]
    pub request_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub request: Option<EmergencyRequestBody>,
    #[serde(default = "default_smart_limit")]
    #[validate(range(min = 1, max = 20))]
    pub limit: u16,
}

fn default_smart_limit() -> u16 {
    5
}

/// AI demand prediction for a city
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BloodPredictionRequest {
    #[validate(length(min = 1))]
    pub city: String,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default = "default_horizon")]
    #[validate(range(min = 1, max = 90))]
    pub horizon_days: u16,
}

fn default_horizon() -> u16 {
    7
}
