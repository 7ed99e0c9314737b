use crate::models::{GeoPoint, LocationPrecision, ResolvedLocation};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Coordinate used when a city is missing or not in [`CITY_COORDINATES`] (Mumbai)
pub const DEFAULT_COORDINATE: GeoPoint = GeoPoint::new(19.0760, 72.8777);

/// City centres used when a record has no stored coordinate.
///
/// Keys are lowercase. This is a fixed table, not a geocoder.
const CITY_COORDINATES: &[(&str, GeoPoint)] = &[
    ("mumbai", GeoPoint::new(19.0760, 72.8777)),
    ("delhi", GeoPoint::new(28.7041, 77.1025)),
    ("bangalore", GeoPoint::new(12.9716, 77.5946)),
    ("hyderabad", GeoPoint::new(17.3850, 78.4867)),
    ("chennai", GeoPoint::new(13.0827, 80.2707)),
    ("kolkata", GeoPoint::new(22.5726, 88.3639)),
    ("pune", GeoPoint::new(18.5204, 73.8567)),
    ("ahmedabad", GeoPoint::new(23.0225, 72.5714)),
    ("jaipur", GeoPoint::new(26.9124, 75.7873)),
    ("surat", GeoPoint::new(21.1702, 72.8311)),
    ("lucknow", GeoPoint::new(26.8467, 80.9462)),
    ("kanpur", GeoPoint::new(26.4499, 80.3319)),
    ("nagpur", GeoPoint::new(21.1458, 79.0882)),
    ("indore", GeoPoint::new(22.7196, 75.8577)),
    ("thane", GeoPoint::new(19.2183, 72.9781)),
    ("bhopal", GeoPoint::new(23.2599, 77.4126)),
    ("visakhapatnam", GeoPoint::new(17.6868, 83.2185)),
    ("patna", GeoPoint::new(25.5941, 85.1376)),
    ("vadodara", GeoPoint::new(22.3072, 73.1812)),
    ("ghaziabad", GeoPoint::new(28.6692, 77.4538)),
];

const CITY_ALIASES: &[(&str, &str)] = &[
    ("bengaluru", "bangalore"),
    ("new delhi", "delhi"),
    ("bombay", "mumbai"),
    ("calcutta", "kolkata"),
    ("madras", "chennai"),
    ("vizag", "visakhapatnam"),
];

/// Geospatial bounding box
///
/// Longitude is stored as a center and half-width so boxes that cross the
/// antimeridian need no special casing. A `lon_delta` of 180 or more covers
/// every longitude (the circle reaches a pole).
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub center_lon: f64,
    pub lon_delta: f64,
}

/// Calculate the Haversine distance between two points in kilometers
///
/// Latitudes are clamped to [-90, 90] and longitudes to [-180, 180]
/// before conversion, so out-of-range input still yields a finite,
/// non-negative distance.
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.clamp(-90.0, 90.0);
    let lat2 = lat2.clamp(-90.0, 90.0);
    let lon1 = lon1.clamp(-180.0, 180.0);
    let lon2 = lon2.clamp(-180.0, 180.0);

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    (EARTH_RADIUS_KM * c).max(0.0)
}

/// Haversine distance between two points
#[inline]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Round a distance to one decimal place for display
#[inline]
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Look up a city centre by name.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// Unknown and empty names resolve to [`DEFAULT_COORDINATE`] with
/// [`LocationPrecision::Fallback`]; such distances are plausible but
/// wrong, and callers should check the precision before relying on them.
pub fn city_to_coordinate(city: &str) -> ResolvedLocation {
    let key = city.trim().to_lowercase();
    let key = CITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key.as_str());

    match CITY_COORDINATES.iter().find(|(name, _)| *name == key) {
        Some((_, point)) => ResolvedLocation {
            point: *point,
            precision: LocationPrecision::City,
        },
        None => {
            tracing::debug!("Unknown city {:?}, using default coordinate", city);
            ResolvedLocation {
                point: DEFAULT_COORDINATE,
                precision: LocationPrecision::Fallback,
            }
        }
    }
}

/// Resolve a record's position: stored coordinate, then city, then fallback
pub fn resolve_location(coordinate: Option<GeoPoint>, city: Option<&str>) -> ResolvedLocation {
    if let Some(point) = coordinate {
        return ResolvedLocation {
            point,
            precision: LocationPrecision::Exact,
        };
    }

    city_to_coordinate(city.unwrap_or_default())
}

/// Names of all cities in the lookup table
pub fn known_cities() -> impl Iterator<Item = &'static str> {
    CITY_COORDINATES.iter().map(|(name, _)| *name)
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than Haversine, used to pre-filter before exact distance.
/// The box always contains the whole search circle: the longitude half-width
/// is `asin(sin(d) / cos(lat))` for angular radius `d`, and it widens to the
/// full circle once the search radius reaches a pole.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat = lat.clamp(-90.0, 90.0);
    let angular = radius_km.max(0.0) / EARTH_RADIUS_KM;
    // Absorbs float error at the exact edge of the circle
    let lat_delta = angular.to_degrees() + 1e-9;

    let min_lat = lat - lat_delta;
    let max_lat = lat + lat_delta;

    let reaches_pole = min_lat <= -90.0 || max_lat >= 90.0;
    let ratio = angular.sin() / lat.to_radians().cos();
    let lon_delta = if reaches_pole || angular >= std::f64::consts::FRAC_PI_2 || !(ratio < 1.0) {
        180.0
    } else {
        ratio.asin().to_degrees() + 1e-9
    };

    BoundingBox {
        min_lat,
        max_lat,
        center_lon: lon,
        lon_delta,
    }
}

/// Signed longitude difference folded into [-180, 180)
#[inline]
fn longitude_offset(lon: f64, center: f64) -> f64 {
    (lon - center + 540.0).rem_euclid(360.0) - 180.0
}

/// Check if a point is within a bounding box
///
/// Input is clamped the same way [`haversine_distance`] clamps it.
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    let lat = lat.clamp(-90.0, 90.0);
    if lat < bbox.min_lat || lat > bbox.max_lat {
        return false;
    }
    if bbox.lon_delta >= 180.0 {
        return true;
    }

    longitude_offset(lon.clamp(-180.0, 180.0), bbox.center_lon.clamp(-180.0, 180.0)).abs() <= bbox.lon_delta
}
