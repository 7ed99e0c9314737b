use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{
    compatibility::is_compatible_blood_group,
    distance::{calculate_bounding_box, distance_km, is_within_bounding_box, resolve_location, round_to_tenth},
    eligibility::is_eligible_at,
    scoring::{calculate_match_score_with_jitter, MAX_JITTER},
};
use crate::models::{DonationRecord, DonationStatus, Donor, DonorMatch, EmergencyRequest, ScoringWeights};

/// Default search radius in kilometers
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// Knobs for a single matching run
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub max_distance_km: f64,
    /// Skip donors flagged inactive
    pub active_only: bool,
    /// Skip donors whose position could only be guessed
    pub exclude_imprecise: bool,
    /// Seed for the 0-9 point tie-break jitter; `None` disables it
    pub jitter_seed: Option<u64>,
    /// Evaluation time for eligibility; `None` means now
    pub now: Option<DateTime<Utc>>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            active_only: true,
            exclude_imprecise: false,
            jitter_seed: None,
            now: None,
        }
    }
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matches: Vec<DonorMatch>,
    pub total_candidates: usize,
    pub compatible_candidates: usize,
    pub imprecise_locations: usize,
}

impl MatchResult {
    /// Keep only the `n` best matches
    pub fn truncate(&mut self, n: usize) {
        self.matches.truncate(n);
    }
}

/// Donor matching orchestrator
///
/// # Pipeline Stages
/// 1. Blood group compatibility (and activity) filter
/// 2. Location resolution: stored coordinate, city table, fallback
/// 3. Bounding box pre-filter, then Haversine radius filter
/// 4. Eligibility from the latest non-rejected donation
/// 5. Scoring and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank donors for an emergency request
    ///
    /// Returns every surviving donor sorted by score (descending), then
    /// distance (ascending), then donor id, so identical input always
    /// yields identical output. Truncation is left to the caller.
    ///
    /// # Arguments
    /// * `donors` - The donor roster
    /// * `donations` - Donation history for any subset of the roster
    /// * `request` - The emergency request to match against
    /// * `options` - Radius, filters, jitter seed and evaluation time
    pub fn find_matches(
        &self,
        donors: &[Donor],
        donations: &[DonationRecord],
        request: &EmergencyRequest,
        options: &MatchOptions,
    ) -> MatchResult {
        let total_candidates = donors.len();
        let now = options.now.unwrap_or_else(Utc::now);

        let origin = resolve_location(request.coordinate(), request.location.as_deref());
        if origin.is_fallback() {
            tracing::warn!(
                "Request {} has no usable location ({:?}), distances use the default coordinate",
                request.id,
                request.location
            );
        }

        let bounding_box = calculate_bounding_box(origin.point.lat, origin.point.lng, options.max_distance_km);
        let latest = latest_donations(donations);
        let mut rng = options.jitter_seed.map(StdRng::seed_from_u64);
        let mut compatible_candidates = 0;

        let mut matches: Vec<DonorMatch> = donors
            .iter()
            // Stage 1: activity and compatibility
            .filter(|donor| !options.active_only || donor.is_active)
            .filter(|donor| is_compatible_blood_group(&donor.blood_type, &request.blood_type))
            .inspect(|_| compatible_candidates += 1)
            // Stage 2 & 3: location and radius
            .filter_map(|donor| {
                let location = resolve_location(donor.coordinate(), donor.city.as_deref());
                if options.exclude_imprecise && location.is_fallback() {
                    return None;
                }
                if !is_within_bounding_box(location.point.lat, location.point.lng, &bounding_box) {
                    return None;
                }

                let distance = distance_km(origin.point, location.point);
                if distance > options.max_distance_km {
                    return None;
                }

                Some((donor, location.precision, distance))
            })
            // Stage 4 & 5: eligibility and scoring
            .map(|(donor, precision, distance)| {
                let last_donation = latest.get(donor.id.as_str()).map(|record| (*record).clone());
                let is_eligible = is_eligible_at(last_donation.as_ref().map(|d| d.donated_at), now);
                let jitter = rng
                    .as_mut()
                    .map(|rng| rng.gen_range(0..=MAX_JITTER))
                    .unwrap_or(0);

                let match_score = calculate_match_score_with_jitter(
                    &donor.blood_type,
                    &request.blood_type,
                    distance,
                    is_eligible,
                    &self.weights,
                    jitter,
                );

                DonorMatch {
                    donor: donor.clone(),
                    distance_km: round_to_tenth(distance),
                    last_donation,
                    is_eligible,
                    match_score,
                    location_precision: precision,
                }
            })
            .collect();

        matches.sort_by(compare_matches);

        let imprecise_locations = matches
            .iter()
            .filter(|m| m.location_precision == crate::models::LocationPrecision::Fallback)
            .count();

        tracing::debug!(
            "Matched {} of {} donors for {} request {} ({} compatible, {} imprecise)",
            matches.len(),
            total_candidates,
            request.blood_type,
            request.id,
            compatible_candidates,
            imprecise_locations
        );

        MatchResult {
            matches,
            total_candidates,
            compatible_candidates,
            imprecise_locations,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Most recent non-rejected donation per donor
fn latest_donations(donations: &[DonationRecord]) -> HashMap<&str, &DonationRecord> {
    let mut latest: HashMap<&str, &DonationRecord> = HashMap::new();
    for record in donations
        .iter()
        .filter(|d| d.status != DonationStatus::Rejected)
    {
        latest
            .entry(record.donor_id.as_str())
            .and_modify(|current| {
                if record.donated_at > current.donated_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest
}

/// Score descending, then distance ascending, then donor id
fn compare_matches(a: &DonorMatch, b: &DonorMatch) -> Ordering {
    b.match_score
        .cmp(&a.match_score)
        .then_with(|| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.donor.id.cmp(&b.donor.id))
}
