// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BloodType, DonationRecord, DonationStatus, DonationType, Donor, DonorMatch, EmergencyRequest,
    GeoPoint, LocationPrecision, ParseBloodTypeError, ResolvedLocation, ScoringWeights, Urgency,
};
pub use requests::{
    BloodPredictionRequest, EmergencyRequestBody, FindMatchesRequest, MatchesQuery,
    RecordDonationRequest, RegisterDonorRequest, SmartMatchingRequest, UpdateDonationStatusRequest,
    UpdateDonorRequest,
};
pub use responses::{
    BloodPredictionResponse, ErrorResponse, FindMatchesResponse, HealthResponse,
    SmartMatchingResponse,
};
