//! Donor Match - donor matching and compatibility scoring for emergency blood requests
//!
//! The core is a set of pure functions: ABO/Rh compatibility, Haversine
//! distance with a city-coordinate fallback, the 56-day eligibility window
//! and a 0-100 match score, composed by [`Matcher`] into a ranked list.
//! The service layer wraps it in an in-memory registry and HTTP routes.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Matcher, MatchOptions, MatchResult, distance::{haversine_distance, city_to_coordinate}};
pub use models::{Donor, DonationRecord, EmergencyRequest, DonorMatch, BloodType, ScoringWeights};
