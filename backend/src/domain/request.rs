//! Blood request aggregate and its status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Coordinates;
use super::{BloodType, Error, UserId};

/// Stable request identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
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

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

macro_rules! string_enum {
    (
        $(#[$outer:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)? }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Canonical wire string for this variant.
            pub const fn as_str(self) -> &'static str {
                match self { $( Self::$variant => $text, )+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s { $( $text => Ok(Self::$variant), )+ _ => Err(()) }
            }
        }
    };
}

string_enum! {
    /// How urgently the request needs donors.
    pub enum Urgency {
        /// Routine need.
        Low => "low",
        /// Default level.
        Medium => "medium",
        /// Needed within days.
        High => "high",
        /// Immediate, life-threatening need.
        Critical => "critical",
    }
}

string_enum! {
    /// Lifecycle state of a blood request.
    ///
    /// `open → in-progress → fulfilled`, with `closed` reachable from `open`
    /// or `in-progress` via explicit cancellation only. Fulfilment is
    /// append-only: un-verifying a donation never reverts it.
    pub enum RequestStatus {
        /// No donor matched yet.
        Open => "open",
        /// At least one donor in the matched list.
        InProgress => "in-progress",
        /// Verified donations reached `units_needed`.
        Fulfilled => "fulfilled",
        /// Cancelled by the requester.
        Closed => "closed",
    }
}

string_enum! {
    /// Progress of one matched donor against a request.
    pub enum MatchStatus {
        /// Listed as a candidate or volunteer.
        Matched => "matched",
        /// The requester reached out.
        Contacted => "contacted",
        /// The donor committed to donate.
        Confirmed => "confirmed",
        /// A donation tied to this request was recorded.
        Donated => "donated",
    }
}

/// The patient the blood is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Patient name.
    pub name: String,
    /// Required blood type of the recipient.
    pub blood_type: BloodType,
    /// Optional age in years.
    pub age: Option<u32>,
    /// Optional gender, free form.
    pub gender: Option<String>,
}

/// Hospital where the donation is needed or took place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    /// Hospital name; required on requests.
    pub name: String,
    /// Street address.
    pub address: Option<String>,
    /// City, used by location-filtered matching.
    pub city: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Optional map coordinates.
    pub coordinates: Option<Coordinates>,
}

/// One donor tracked against a request.
///
/// The containing list holds at most one entry per donor; adds are
/// idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedDonor {
    /// The matched donor.
    pub donor: UserId,
    /// Progress of this match.
    pub status: MatchStatus,
    /// When the donor was first matched.
    pub matched_at: DateTime<Utc>,
}

/// A patient's need for blood, owned by the requesting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    /// Stable identifier.
    pub id: RequestId,
    /// Owning user; the only one allowed to mutate or cancel.
    pub requester: UserId,
    /// Who the blood is for.
    pub patient: Patient,
    /// Where it is needed.
    pub hospital: Hospital,
    /// Units required before the request counts as fulfilled.
    pub units_needed: u32,
    /// Urgency level.
    pub urgency: Urgency,
    /// Lifecycle state.
    pub status: RequestStatus,
    /// Free-form context for donors.
    pub description: Option<String>,
    /// Donors matched so far, oldest first.
    pub matched_donors: Vec<MatchedDonor>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl BloodRequest {
    /// Create a new open request.
    pub fn new(
        requester: UserId,
        patient: Patient,
        hospital: Hospital,
        units_needed: u32,
        urgency: Urgency,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::random(),
            requester,
            patient,
            hospital,
            units_needed,
            urgency,
            status: RequestStatus::Open,
            description,
            matched_donors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` owns this request.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.requester == *user
    }

    /// Add a donor to the matched list, flipping `open` to `in-progress` on
    /// the first entry. Returns `false` when the donor was already present
    /// (the add is idempotent and leaves the status untouched).
    pub fn add_matched_donor(&mut self, donor: UserId, at: DateTime<Utc>) -> bool {
        if self.matched_donors.iter().any(|m| m.donor == donor) {
            return false;
        }
        self.matched_donors.push(MatchedDonor {
            donor,
            status: MatchStatus::Matched,
            matched_at: at,
        });
        if self.status == RequestStatus::Open {
            self.status = RequestStatus::InProgress;
        }
        self.updated_at = at;
        true
    }

    /// Record the verified-donation tally, transitioning to `fulfilled` when
    /// the threshold is met. Returns `true` when the status changed.
    ///
    /// The transition is one way: extra verified donations past the
    /// threshold and later un-verifications leave a fulfilled request
    /// untouched, and closed requests stay closed.
    pub fn apply_verified_tally(&mut self, verified_donations: u64, at: DateTime<Utc>) -> bool {
        let threshold_met = verified_donations >= u64::from(self.units_needed);
        let transitionable = matches!(
            self.status,
            RequestStatus::Open | RequestStatus::InProgress
        );
        if threshold_met && transitionable {
            self.status = RequestStatus::Fulfilled;
            self.updated_at = at;
            return true;
        }
        false
    }

    /// Cancel the request. Fulfilled requests cannot be cancelled; cancelling
    /// an already-closed request is a no-op.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            RequestStatus::Fulfilled => {
                Err(Error::conflict("a fulfilled request cannot be cancelled"))
            }
            RequestStatus::Closed => Ok(()),
            RequestStatus::Open | RequestStatus::InProgress => {
                self.status = RequestStatus::Closed;
                self.updated_at = at;
                Ok(())
            }
        }
    }
}
