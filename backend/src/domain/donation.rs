//! Donation records.
//!
//! A donation is immutable once written, except for the `verified` flag
//! which an administrator may flip from `false` to `true` exactly once.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::Hospital;
use super::{RequestId, UserId};

/// Stable donation identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonationId(Uuid);

impl DonationId {
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

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DonationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A completed donation, reported by the donor.
///
/// The `request` field is a weak back-reference: deleting the request leaves
/// the donation in place with the reference cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    /// Stable identifier.
    pub id: DonationId,
    /// The donating user; owns read access to this record.
    pub donor: UserId,
    /// Request this donation answers, if any.
    pub request: Option<RequestId>,
    /// Where the donation took place.
    pub hospital: Hospital,
    /// When the blood was given.
    pub donation_date: DateTime<Utc>,
    /// Units donated, at least one.
    pub units: u32,
    /// Set by an administrator once the donation is confirmed; only verified
    /// donations count towards request fulfilment.
    pub verified: bool,
    /// Optional reference to an uploaded verification document.
    pub verification_document: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Create a new unverified donation dated now.
    pub fn new(donor: UserId, request: Option<RequestId>, hospital: Hospital, units: u32) -> Self {
        let now = Utc::now();
        Self {
            id: DonationId::random(),
            donor,
            request,
            hospital,
            donation_date: now,
            units,
            verified: false,
            verification_document: None,
            notes: None,
            created_at: now,
        }
    }

    /// Attach free-form notes.
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Override the donation date (defaults to creation time).
    pub fn with_donation_date(mut self, at: DateTime<Utc>) -> Self {
        self.donation_date = at;
        self
    }
}
