use chrono::{DateTime, Duration, Utc};

/// Minimum whole-blood inter-donation interval in days
pub const MIN_DONATION_INTERVAL_DAYS: i64 = 56;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole calendar days elapsed between `since` and `now` (floor division)
#[inline]
pub fn days_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Check whether a donor may give blood at `now`
///
/// A donor with no previous donation is always eligible. A donation
/// dated in the future never is.
#[inline]
pub fn is_eligible_at(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_donation {
        None => true,
        Some(last) => days_since(last, now) >= MIN_DONATION_INTERVAL_DAYS,
    }
}

/// Check eligibility against the current wall clock
pub fn is_eligible(last_donation: Option<DateTime<Utc>>) -> bool {
    is_eligible_at(last_donation, Utc::now())
}

/// Earliest moment a donor may give again after donating at `last_donation`
#[inline]
pub fn next_eligible_date(last_donation: DateTime<Utc>) -> DateTime<Utc> {
    last_donation + Duration::days(MIN_DONATION_INTERVAL_DAYS)
}
