//! Driving ports: the application surface consumed by HTTP handlers.
//!
//! Handlers see only these traits; the concrete services behind them are
//! wired once at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use super::request_repository::RequestListFilter;
use super::user_repository::DonorBrowseFilter;
use crate::domain::matching::LocationFilter;
use crate::domain::request::{Hospital, Patient};
use crate::domain::{
    BloodRequest, BloodType, Donation, DonationId, Error, Location, RequestId, Urgency, User,
    UserId,
};

/// Partial profile update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New contact number.
    pub phone: Option<String>,
    /// New blood type.
    pub blood_type: Option<BloodType>,
    /// Replacement location.
    pub location: Option<Location>,
}

/// Input for creating a blood request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    /// Who the blood is for.
    pub patient: Patient,
    /// Where it is needed.
    pub hospital: Hospital,
    /// Units required, at least one.
    pub units_needed: u32,
    /// Urgency level.
    pub urgency: Urgency,
    /// Free-form context for donors.
    pub description: Option<String>,
}

/// Partial request update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestUpdate {
    /// Replacement hospital details.
    pub hospital: Option<Hospital>,
    /// New units target.
    pub units_needed: Option<u32>,
    /// New urgency level.
    pub urgency: Option<Urgency>,
    /// New description.
    pub description: Option<String>,
}

/// Input for recording a completed donation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    /// Request this donation answers, if any.
    pub request: Option<RequestId>,
    /// Where the donation took place.
    pub hospital: Hospital,
    /// Units donated, at least one.
    pub units: u32,
    /// When the blood was given; defaults to now.
    pub donation_date: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Account and donor-directory operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Resolve a bearer token to a local user, creating the account on first
    /// sight.
    async fn authenticate_bearer(&self, token: &str) -> Result<User, Error>;

    /// Fetch the caller's profile, refreshing the stored eligibility flag.
    async fn get_profile(&self, id: &UserId) -> Result<User, Error>;

    /// Apply a partial profile update.
    async fn update_profile(&self, id: &UserId, changes: ProfileUpdate) -> Result<User, Error>;

    /// Public view of any user.
    async fn get_user(&self, id: &UserId) -> Result<User, Error>;

    /// Page through the donor directory.
    async fn browse_donors(
        &self,
        filter: DonorBrowseFilter,
        page: PageRequest,
    ) -> Result<Page<User>, Error>;
}

/// Blood-request CRUD and lifecycle operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestsService: Send + Sync {
    /// Create an open request owned by `requester`.
    async fn create(&self, requester: &User, input: NewRequest) -> Result<BloodRequest, Error>;

    /// Page through requests, newest first.
    async fn list(
        &self,
        filter: RequestListFilter,
        page: PageRequest,
    ) -> Result<Page<BloodRequest>, Error>;

    /// Fetch one request.
    async fn get(&self, id: &RequestId) -> Result<BloodRequest, Error>;

    /// Apply a partial update; requester only, not after fulfilment or
    /// closure.
    async fn update(
        &self,
        caller: &User,
        id: &RequestId,
        changes: RequestUpdate,
    ) -> Result<BloodRequest, Error>;

    /// Cancel a request; requester only.
    async fn cancel(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error>;

    /// Delete a request outright; requester only.
    async fn delete(&self, caller: &User, id: &RequestId) -> Result<(), Error>;
}

/// Donor-matching operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchingService: Send + Sync {
    /// Read-only candidate listing for a request.
    async fn candidates(
        &self,
        id: &RequestId,
        filter: LocationFilter,
    ) -> Result<Vec<User>, Error>;

    /// Match all current candidates to the request and notify them;
    /// requester only.
    async fn match_donors(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error>;

    /// Volunteer the caller as a donor for the request.
    async fn volunteer(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error>;
}

/// Donation reporting and verification operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationsService: Send + Sync {
    /// Record a completed donation by the caller.
    async fn record(&self, donor: &User, input: NewDonation) -> Result<Donation, Error>;

    /// All donations reported by the caller, newest first.
    async fn my_donations(&self, donor: &UserId) -> Result<Vec<Donation>, Error>;

    /// Fetch one donation; its donor or an administrator only.
    async fn get(&self, caller: &User, id: &DonationId) -> Result<Donation, Error>;

    /// Mark a donation verified; administrators only.
    async fn verify(&self, caller: &User, id: &DonationId) -> Result<Donation, Error>;
}
