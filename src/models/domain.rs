use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// ABO/Rh blood group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O-")]
    ONeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "AB+")]
    AbPos,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::ONeg,
        BloodType::OPos,
        BloodType::ANeg,
        BloodType::APos,
        BloodType::BNeg,
        BloodType::BPos,
        BloodType::AbNeg,
        BloodType::AbPos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::ONeg => "O-",
            BloodType::OPos => "O+",
            BloodType::ANeg => "A-",
            BloodType::APos => "A+",
            BloodType::BNeg => "B-",
            BloodType::BPos => "B+",
            BloodType::AbNeg => "AB-",
            BloodType::AbPos => "AB+",
        }
    }

    pub fn is_rh_negative(&self) -> bool {
        matches!(
            self,
            BloodType::ONeg | BloodType::ANeg | BloodType::BNeg | BloodType::AbNeg
        )
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the eight ABO/Rh groups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blood type: {0:?}")]
pub struct ParseBloodTypeError(pub String);

impl FromStr for BloodType {
    type Err = ParseBloodTypeError;

    /// Accepts `A+`, `ab-`, ` O − ` (unicode minus), `Bpos`, `ABneg`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '\u{2212}' { '-' } else { c })
            .collect::<String>()
            .to_ascii_uppercase();

        let (group, rh) = if let Some(g) = normalized.strip_suffix("POS") {
            (g, '+')
        } else if let Some(g) = normalized.strip_suffix("NEG") {
            (g, '-')
        } else if let Some(g) = normalized.strip_suffix('+') {
            (g, '+')
        } else if let Some(g) = normalized.strip_suffix('-') {
            (g, '-')
        } else {
            return Err(ParseBloodTypeError(s.to_string()));
        };

        match (group, rh) {
            ("O", '-') => Ok(BloodType::ONeg),
            ("O", '+') => Ok(BloodType::OPos),
            ("A", '-') => Ok(BloodType::ANeg),
            ("A", '+') => Ok(BloodType::APos),
            ("B", '-') => Ok(BloodType::BNeg),
            ("B", '+') => Ok(BloodType::BPos),
            ("AB", '-') => Ok(BloodType::AbNeg),
            ("AB", '+') => Ok(BloodType::AbPos),
            _ => Err(ParseBloodTypeError(s.to_string())),
        }
    }
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// How a coordinate used for distance was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationPrecision {
    /// Stored latitude/longitude
    Exact,
    /// Known city centre from the lookup table
    City,
    /// Unknown or missing city, resolved to the default coordinate
    Fallback,
}

/// A coordinate plus the precision it was resolved with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub point: GeoPoint,
    pub precision: LocationPrecision,
}

impl ResolvedLocation {
    pub fn is_fallback(&self) -> bool {
        self.precision == LocationPrecision::Fallback
    }
}

/// Registered blood donor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    pub id: String,
    pub name: String,
    /// Raw blood group as supplied; malformed values never match
    #[serde(rename = "bloodType")]
    pub blood_type: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "registeredAt", default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

impl Donor {
    /// Parsed blood group, `None` when the stored value is malformed
    pub fn blood_group(&self) -> Option<BloodType> {
        self.blood_type.parse().ok()
    }

    /// Stored coordinate, only when both halves are present
    pub fn coordinate(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationType {
    /// Scheduled donation tied to a specific recipient
    Bridge,
    Voluntary,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Complete,
    Rejected,
}

impl DonationStatus {
    /// Only pending donations may change status
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::Complete)
                | (DonationStatus::Pending, DonationStatus::Rejected)
        )
    }
}

/// A single donation event in a donor's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: Uuid,
    #[serde(rename = "donorId")]
    pub donor_id: String,
    #[serde(rename = "donatedAt")]
    pub donated_at: DateTime<Utc>,
    #[serde(rename = "donationType")]
    pub donation_type: DonationType,
    pub status: DonationStatus,
}

impl DonationRecord {
    pub fn new(donor_id: impl Into<String>, donated_at: DateTime<Utc>, donation_type: DonationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            donor_id: donor_id.into(),
            donated_at,
            donation_type,
            status: DonationStatus::Pending,
        }
    }

    /// Earliest date the donor may give whole blood again
    pub fn next_eligible_at(&self) -> DateTime<Utc> {
        crate::core::eligibility::next_eligible_date(self.donated_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// A request for blood raised by a hospital or patient family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRequest {
    pub id: Uuid,
    #[serde(rename = "bloodType")]
    pub blood_type: String,
    #[serde(rename = "unitsRequired")]
    pub units_required: u32,
    pub urgency: Urgency,
    /// City name, used when no coordinate is given
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl EmergencyRequest {
    pub fn coordinate(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

/// Ranked donor for an emergency request, recomputed on every match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorMatch {
    pub donor: Donor,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    #[serde(rename = "lastDonation")]
    pub last_donation: Option<DonationRecord>,
    #[serde(rename = "isEligible")]
    pub is_eligible: bool,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
    #[serde(rename = "locationPrecision")]
    pub location_precision: LocationPrecision,
}

/// Points awarded by the compatibility scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub compatible: u8,
    pub exact_match: u8,
    pub eligible: u8,
    pub within_5km: u8,
    pub within_10km: u8,
    pub within_20km: u8,
    pub within_50km: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            compatible: 40,
            exact_match: 10,
            eligible: 20,
            within_5km: 30,
            within_10km: 25,
            within_20km: 20,
            within_50km: 10,
        }
    }
}
