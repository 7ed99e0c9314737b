// Core algorithm exports
pub mod compatibility;
pub mod distance;
pub mod eligibility;
pub mod matcher;
pub mod scoring;

pub use compatibility::is_compatible_blood_group;
pub use distance::{
    calculate_bounding_box, city_to_coordinate, distance_km, haversine_distance,
    is_within_bounding_box, resolve_location, BoundingBox, DEFAULT_COORDINATE,
};
pub use eligibility::{is_eligible, is_eligible_at, next_eligible_date, MIN_DONATION_INTERVAL_DAYS};
pub use matcher::{MatchOptions, MatchResult, Matcher, DEFAULT_MAX_DISTANCE_KM};
pub use scoring::{calculate_match_score, calculate_match_score_with_jitter};
