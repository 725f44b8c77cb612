//! User aggregate: identity, blood type, location, and donation history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BloodType;

/// Number of calendar months a donor must wait between donations.
///
/// Calendar-month arithmetic, not a fixed day count: a donation on 30
/// November becomes eligible again on the last day of February or later,
/// matching `chrono::Months` semantics. The boundary is inclusive — exactly
/// three months after the last donation the donor is eligible again.
pub const ELIGIBILITY_COOLDOWN_MONTHS: u32 = 3;

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Geographic point attached to a user or hospital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// Free-form location of a user. All parts are optional; matching only ever
/// compares city and state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// City name as entered by the user.
    pub city: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Optional map coordinates.
    pub coordinates: Option<Coordinates>,
}

/// Application user, doubling as a potential donor once a blood type is set.
///
/// ## Invariants
/// - `external_id` and `email` are unique across users (enforced by the
///   repository).
/// - `is_eligible` is denormalised: it must be `false` immediately after a
///   donation and may lag behind the time-based rule until the next
///   recomputation; [`User::eligible_at`] is the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Subject issued by the identity provider.
    pub external_id: String,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional contact number.
    pub phone: Option<String>,
    /// ABO/Rh blood type; unset until the user completes their profile.
    pub blood_type: Option<BloodType>,
    /// Where the user is based.
    pub location: Location,
    /// Lifetime number of recorded donations.
    pub donation_count: u32,
    /// Timestamp of the most recent donation, if any.
    pub last_donation: Option<DateTime<Utc>>,
    /// Stored eligibility flag; see the struct invariants.
    pub is_eligible: bool,
    /// Grants access to the donation verification endpoint.
    pub is_admin: bool,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a fresh user as seen for the first time via the identity
    /// provider.
    pub fn new(
        external_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::random(),
            external_id: external_id.into(),
            email: email.into(),
            name: name.into(),
            phone: None,
            blood_type: None,
            location: Location::default(),
            donation_count: 0,
            last_donation: None,
            is_eligible: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user may donate at `now`, computed from the cooldown rule
    /// rather than the stored flag.
    pub fn eligible_at(&self, now: DateTime<Utc>) -> bool {
        match self.last_donation {
            None => true,
            Some(last) => last
                .checked_add_months(Months::new(ELIGIBILITY_COOLDOWN_MONTHS))
                .is_some_and(|reopens| reopens <= now),
        }
    }

    /// Apply the counter and eligibility side effects of a recorded donation.
    pub fn record_donation(&mut self, at: DateTime<Utc>) {
        self.donation_count += 1;
        self.last_donation = Some(at);
        self.is_eligible = false;
        self.updated_at = at;
    }

    /// Bring the stored eligibility flag in line with the time-based rule.
    ///
    /// Returns `true` when the flag changed and the record should be
    /// persisted.
    pub fn refresh_eligibility(&mut self, now: DateTime<Utc>) -> bool {
        let computed = self.eligible_at(now);
        if computed == self.is_eligible {
            return false;
        }
        self.is_eligible = computed;
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn fixture_user() -> User {
        User::new("auth0|abc", "donor@example.com", "Test Donor")
    }

    #[rstest]
    fn new_users_are_eligible() {
        let user = fixture_user();
        assert!(user.last_donation.is_none());
        assert!(user.eligible_at(Utc::now()));
        assert!(user.is_eligible);
        assert_eq!(user.donation_count, 0);
    }

    #[rstest]
    fn recent_donation_blocks_eligibility() {
        let mut user = fixture_user();
        let now = Utc::now();
        user.last_donation = Some(now - Duration::days(89));
        assert!(!user.eligible_at(now));
    }

    #[rstest]
    fn three_calendar_months_reopen_eligibility() {
        let mut user = fixture_user();
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).single().expect("valid");
        // Exactly three months earlier: boundary is inclusive.
        user.last_donation = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).single();
        assert!(user.eligible_at(now));
        // One second inside the window: still blocked.
        user.last_donation = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 1).single();
        assert!(!user.eligible_at(now));
        // Three months and one day: clearly eligible.
        user.last_donation = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single();
        assert!(user.eligible_at(now));
    }

    #[rstest]
    fn month_end_clamps_like_the_calendar() {
        // 30 November + 3 months clamps to 28 February (2026 is not a leap
        // year), so 1 March is already past the boundary.
        let mut user = fixture_user();
        user.last_donation = Utc.with_ymd_and_hms(2025, 11, 30, 0, 0, 0).single();
        let first_march = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().expect("valid");
        assert!(user.eligible_at(first_march));
        let mid_february = Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).single().expect("valid");
        assert!(!user.eligible_at(mid_february));
    }

    #[rstest]
    fn record_donation_updates_counters_and_flag() {
        let mut user = fixture_user();
        let at = Utc::now();
        user.record_donation(at);
        assert_eq!(user.donation_count, 1);
        assert_eq!(user.last_donation, Some(at));
        assert!(!user.is_eligible);

        // Regardless of prior state.
        user.record_donation(at);
        assert_eq!(user.donation_count, 2);
        assert!(!user.is_eligible);
    }

    #[rstest]
    fn refresh_eligibility_reports_drift() {
        let mut user = fixture_user();
        let now = Utc::now();
        user.last_donation = Some(now - Duration::days(200));
        user.is_eligible = false;
        assert!(user.refresh_eligibility(now));
        assert!(user.is_eligible);
        // Second refresh is a no-op.
        assert!(!user.refresh_eligibility(now));
    }
}
