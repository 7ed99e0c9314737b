use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    DonationRecord, DonationStatus, Donor, EmergencyRequest, UpdateDonorRequest,
};

/// Errors that can occur when reading or writing the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Donor not found: {0}")]
    DonorNotFound(String),

    #[error("Donation not found: {0}")]
    DonationNotFound(Uuid),

    #[error("Emergency request not found: {0}")]
    RequestNotFound(Uuid),

    #[error("Donor already registered: {0}")]
    DuplicateDonor(String),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition {
        from: DonationStatus,
        to: DonationStatus,
    },
}

/// Record counts, reported by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryCounts {
    pub donors: usize,
    pub donations: usize,
    pub requests: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    // Ordered so roster snapshots are stable across calls
    donors: BTreeMap<String, Donor>,
    donations: Vec<DonationRecord>,
    requests: HashMap<Uuid, EmergencyRequest>,
    // Bumped on every donor or donation write
    generation: u64,
}

/// Owned copy of the matching inputs, tagged with the registry generation
/// it was taken at
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub donors: Vec<Donor>,
    pub donations: Vec<DonationRecord>,
    pub generation: u64,
}

/// In-memory store for donors, donation history and emergency requests
///
/// The matcher only ever sees owned snapshots taken under a read lock,
/// so it stays independent of how records are stored.
#[derive(Debug, Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new donor. Ids are unique.
    pub async fn register_donor(&self, donor: Donor) -> Result<Donor, RegistryError> {
        let mut state = self.state.write().await;
        if state.donors.contains_key(&donor.id) {
            return Err(RegistryError::DuplicateDonor(donor.id));
        }

        tracing::debug!("Registered donor {} ({})", donor.id, donor.blood_type);
        state.donors.insert(donor.id.clone(), donor.clone());
        state.generation += 1;
        Ok(donor)
    }

    pub async fn get_donor(&self, donor_id: &str) -> Result<Donor, RegistryError> {
        let state = self.state.read().await;
        state
            .donors
            .get(donor_id)
            .cloned()
            .ok_or_else(|| RegistryError::DonorNotFound(donor_id.to_string()))
    }

    /// Apply a partial update to a donor's activity and location
    ///
    /// Supplying a city without coordinates clears the stored coordinate,
    /// so the new city is used for distance. A coordinate is only replaced
    /// when both latitude and longitude are given.
    pub async fn update_donor(
        &self,
        donor_id: &str,
        update: &UpdateDonorRequest,
    ) -> Result<Donor, RegistryError> {
        let mut state = self.state.write().await;
        let donor = state
            .donors
            .get_mut(donor_id)
            .ok_or_else(|| RegistryError::DonorNotFound(donor_id.to_string()))?;

        if let Some(is_active) = update.is_active {
            donor.is_active = is_active;
        }
        if let Some(city) = &update.city {
            donor.city = Some(city.clone());
            if update.latitude.is_none() && update.longitude.is_none() {
                donor.latitude = None;
                donor.longitude = None;
            }
        }
        // Half a coordinate never replaces a whole one
        if let (Some(lat), Some(lng)) = (update.latitude, update.longitude) {
            donor.latitude = Some(lat);
            donor.longitude = Some(lng);
        }

        let updated = donor.clone();
        state.generation += 1;
        Ok(updated)
    }

    pub async fn list_donors(&self) -> Vec<Donor> {
        self.state.read().await.donors.values().cloned().collect()
    }

    /// Record a donation for a registered donor
    pub async fn record_donation(&self, record: DonationRecord) -> Result<DonationRecord, RegistryError> {
        let mut state = self.state.write().await;
        if !state.donors.contains_key(&record.donor_id) {
            return Err(RegistryError::DonorNotFound(record.donor_id));
        }

        tracing::debug!(
            "Recorded {:?} donation {} for donor {}",
            record.donation_type,
            record.id,
            record.donor_id
        );
        state.donations.push(record.clone());
        state.generation += 1;
        Ok(record)
    }

    /// Move a pending donation to complete or rejected
    pub async fn update_donation_status(
        &self,
        donation_id: Uuid,
        status: DonationStatus,
    ) -> Result<DonationRecord, RegistryError> {
        let mut state = self.state.write().await;
        let record = state
            .donations
            .iter_mut()
            .find(|d| d.id == donation_id)
            .ok_or(RegistryError::DonationNotFound(donation_id))?;

        if !record.status.can_transition_to(status) {
            return Err(RegistryError::InvalidStatusTransition {
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        let updated = record.clone();
        state.generation += 1;
        Ok(updated)
    }

    /// A donor's donations, newest first
    pub async fn donation_history(&self, donor_id: &str) -> Result<Vec<DonationRecord>, RegistryError> {
        let state = self.state.read().await;
        if !state.donors.contains_key(donor_id) {
            return Err(RegistryError::DonorNotFound(donor_id.to_string()));
        }

        let mut history: Vec<DonationRecord> = state
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.donated_at.cmp(&a.donated_at));
        Ok(history)
    }

    pub async fn create_request(&self, request: EmergencyRequest) -> EmergencyRequest {
        let mut state = self.state.write().await;
        tracing::info!(
            "Emergency request {}: {} unit(s) of {} ({:?})",
            request.id,
            request.units_required,
            request.blood_type,
            request.urgency
        );
        state.requests.insert(request.id, request.clone());
        request
    }

    pub async fn get_request(&self, request_id: Uuid) -> Result<EmergencyRequest, RegistryError> {
        let state = self.state.read().await;
        state
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(RegistryError::RequestNotFound(request_id))
    }

    /// Donor roster and full donation history, taken under one lock
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        RegistrySnapshot {
            donors: state.donors.values().cloned().collect(),
            donations: state.donations.clone(),
            generation: state.generation,
        }
    }

    /// Current write generation; changes whenever match inputs change
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Active donors per blood type for a city (case-insensitive)
    pub async fn active_donors_by_blood_type(&self, city: &str) -> BTreeMap<String, usize> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for donor in state.donors.values().filter(|d| {
            d.is_active
                && d.city
                    .as_deref()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case(city.trim()))
        }) {
            let key = donor
                .blood_group()
                .map(|b| b.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    pub async fn counts(&self) -> RegistryCounts {
        let state = self.state.read().await;
        RegistryCounts {
            donors: state.donors.len(),
            donations: state.donations.len(),
            requests: state.requests.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DonationType, Urgency};
    use chrono::{Duration, Utc};

    fn donor(id: &str, blood_type: &str, city: &str) -> Donor {
        Donor {
            id: id.to_string(),
            name: format!("Donor {}", id),
            blood_type: blood_type.to_string(),
            city: Some(city.to_string()),
            latitude: None,
            longitude: None,
            is_active: true,
            phone: None,
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_and_fetch_donor() {
        let registry = Registry::new();
        registry.register_donor(donor("d1", "O-", "Pune")).await.unwrap();

        let fetched = registry.get_donor("d1").await.unwrap();
        assert_eq!(fetched.blood_type, "O-");
        assert!(matches!(
            registry.get_donor("missing").await,
            Err(RegistryError::DonorNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_donor_rejected() {
        let registry = Registry::new();
        registry.register_donor(donor("d1", "O-", "Pune")).await.unwrap();

        let result = registry.register_donor(donor("d1", "A+", "Delhi")).await;
        assert!(matches!(result, Err(RegistryError::DuplicateDonor(_))));
    }

    #[tokio::test]
    async fn test_donation_requires_known_donor() {
        let registry = Registry::new();
        let record = DonationRecord::new("ghost", Utc::now(), DonationType::Voluntary);

        let result = registry.record_donation(record).await;
        assert!(matches!(result, Err(RegistryError::DonorNotFound(_))));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let registry = Registry::new();
        registry.register_donor(donor("d1", "O-", "Pune")).await.unwrap();
        let record = registry
            .record_donation(DonationRecord::new("d1", Utc::now(), DonationType::Emergency))
            .await
            .unwrap();

        let completed = registry
            .update_donation_status(record.id, DonationStatus::Complete)
            .await
            .unwrap();
        assert_eq!(completed.status, DonationStatus::Complete);

        let again = registry
            .update_donation_status(record.id, DonationStatus::Rejected)
            .await;
        assert!(matches!(
            again,
            Err(RegistryError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let registry = Registry::new();
        registry.register_donor(donor("d1", "O-", "Pune")).await.unwrap();
        let now = Utc::now();
        for days in [90, 10, 200] {
            registry
                .record_donation(DonationRecord::new("d1", now - Duration::days(days), DonationType::Voluntary))
                .await
                .unwrap();
        }

        let history = registry.donation_history("d1").await.unwrap();
        let ages: Vec<i64> = history.iter().map(|d| (now - d.donated_at).num_days()).collect();
        assert_eq!(ages, vec![10, 90, 200]);
    }

    #[tokio::test]
    async fn test_update_city_clears_coordinate() {
        let registry = Registry::new();
        let mut d = donor("d1", "O-", "Pune");
        d.latitude = Some(18.52);
        d.longitude = Some(73.85);
        registry.register_donor(d).await.unwrap();

        let update = UpdateDonorRequest {
            city: Some("Nagpur".to_string()),
            ..UpdateDonorRequest::default()
        };
        let updated = registry.update_donor("d1", &update).await.unwrap();

        assert_eq!(updated.city.as_deref(), Some("Nagpur"));
        assert!(updated.coordinate().is_none());
    }

    #[tokio::test]
    async fn test_half_coordinate_keeps_stored_point() {
        let registry = Registry::new();
        let mut d = donor("d1", "O-", "Pune");
        d.latitude = Some(18.52);
        d.longitude = Some(73.85);
        registry.register_donor(d).await.unwrap();

        let update = UpdateDonorRequest {
            latitude: Some(18.60),
            ..UpdateDonorRequest::default()
        };
        let updated = registry.update_donor("d1", &update).await.unwrap();
        assert_eq!(updated.latitude, Some(18.52));
        assert_eq!(updated.longitude, Some(73.85));

        let update = UpdateDonorRequest {
            latitude: Some(18.60),
            longitude: Some(73.90),
            ..UpdateDonorRequest::default()
        };
        let updated = registry.update_donor("d1", &update).await.unwrap();
        assert_eq!(updated.latitude, Some(18.60));
        assert_eq!(updated.longitude, Some(73.90));
    }

    #[tokio::test]
    async fn test_generation_tracks_match_inputs() {
        let registry = Registry::new();
        let start = registry.generation().await;

        registry.register_donor(donor("d1", "O-", "Pune")).await.unwrap();
        let after_register = registry.generation().await;
        assert!(after_register > start);

        let record = registry
            .record_donation(DonationRecord::new("d1", Utc::now(), DonationType::Voluntary))
            .await
            .unwrap();
        let after_donation = registry.generation().await;
        assert!(after_donation > after_register);

        registry
            .update_donation_status(record.id, DonationStatus::Complete)
            .await
            .unwrap();
        let snapshot = registry.snapshot().await;
        assert!(snapshot.generation > after_donation);
        assert_eq!(snapshot.donations.len(), 1);

        // Failed writes leave the generation alone
        assert!(registry.register_donor(donor("d1", "A+", "Pune")).await.is_err());
        assert_eq!(registry.generation().await, snapshot.generation);
    }

    #[tokio::test]
    async fn test_counts_and_city_breakdown() {
        let registry = Registry::new();
        registry.register_donor(donor("d1", "O-", "Pune")).await.unwrap();
        registry.register_donor(donor("d2", "o-", "pune")).await.unwrap();
        registry.register_donor(donor("d3", "A+", "Delhi")).await.unwrap();
        registry
            .create_request(EmergencyRequest {
                id: Uuid::new_v4(),
                blood_type: "A+".to_string(),
                units_required: 1,
                urgency: Urgency::Low,
                location: Some("Delhi".to_string()),
                latitude: None,
                longitude: None,
                created_at: Utc::now(),
            })
            .await;

        let counts = registry.counts().await;
        assert_eq!(counts.donors, 3);
        assert_eq!(counts.requests, 1);

        let pune = registry.active_donors_by_blood_type("Pune").await;
        assert_eq!(pune.get("O-"), Some(&2));
        assert_eq!(pune.len(), 1);
    }
}
