use crate::core::compatibility::is_compatible_blood_group;
use crate::models::{BloodType, ScoringWeights};

/// Largest tie-break jitter the scorer accepts
pub const MAX_JITTER: u8 = 9;

/// Maximum score a match can reach
pub const MAX_SCORE: u8 = 100;

/// Calculate a match score (0-100) for a donor against a required blood type
///
/// Additive scoring with the default weights:
/// score = (
///     40 if compatible (incompatible short-circuits to 0) +
///     10 if the donor type is an exact match +
///     30 / 25 / 20 / 10 for distance within 5 / 10 / 20 / 50 km +
///     20 if the donor is currently eligible
/// ).min(100)
pub fn calculate_match_score(
    donor_type: &str,
    required_type: &str,
    distance_km: f64,
    is_eligible: bool,
    weights: &ScoringWeights,
) -> u8 {
    calculate_match_score_with_jitter(donor_type, required_type, distance_km, is_eligible, weights, 0)
}

/// Same as [`calculate_match_score`] plus a tie-break jitter of at most
/// [`MAX_JITTER`] points. Larger values are capped.
pub fn calculate_match_score_with_jitter(
    donor_type: &str,
    required_type: &str,
    distance_km: f64,
    is_eligible: bool,
    weights: &ScoringWeights,
    jitter: u8,
) -> u8 {
    if !is_compatible_blood_group(donor_type, required_type) {
        return 0;
    }

    let mut score = weights.compatible as u32;

    if is_exact_match(donor_type, required_type) {
        score += weights.exact_match as u32;
    }

    score += calculate_distance_points(distance_km, weights) as u32;

    if is_eligible {
        score += weights.eligible as u32;
    }

    score += jitter.min(MAX_JITTER) as u32;

    score.min(MAX_SCORE as u32) as u8
}

/// Exact group match, comparing parsed types so `a+` equals `A+`
#[inline]
fn is_exact_match(donor_type: &str, required_type: &str) -> bool {
    match (donor_type.parse::<BloodType>(), required_type.parse::<BloodType>()) {
        (Ok(donor), Ok(required)) => donor == required,
        _ => false,
    }
}

/// Points for proximity tiers. Anything beyond 50 km (or not a number) earns 0.
#[inline]
fn calculate_distance_points(distance_km: f64, weights: &ScoringWeights) -> u8 {
    if distance_km <= 5.0 {
        weights.within_5km
    } else if distance_km <= 10.0 {
        weights.within_10km
    } else if distance_km <= 20.0 {
        weights.within_20km
    } else if distance_km <= 50.0 {
        weights.within_50km
    } else {
        0
    }
}
