//! Persistence port for blood requests and their matched-donor lists.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use super::macros::define_port_error;
use crate::domain::{
    BloodRequest, BloodType, MatchStatus, MatchedDonor, RequestId, RequestStatus, Urgency, UserId,
};

define_port_error! {
    /// Failures surfaced by [`RequestRepository`] implementations.
    pub enum RequestPersistenceError {
        /// The backing store could not be reached.
        Connection { message: String } => "request store unavailable: {message}",
        /// A statement failed to execute.
        Query { message: String } => "request query failed: {message}",
    }
}

/// Filter applied when listing requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestListFilter {
    /// Only requests for this recipient blood type.
    pub blood_type: Option<BloodType>,
    /// Only requests at this urgency.
    pub urgency: Option<Urgency>,
    /// Only requests in this state.
    pub status: Option<RequestStatus>,
    /// Case-insensitive hospital city match.
    pub city: Option<String>,
}

/// Driven port over request storage.
///
/// Matched donors live in their own table keyed by `(request, donor)`;
/// [`RequestRepository::add_matched_donor`] must be atomic and idempotent so
/// concurrent matching passes cannot duplicate an entry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Persist a new request.
    async fn insert(&self, request: &BloodRequest) -> Result<(), RequestPersistenceError>;

    /// Fetch a request, matched donors included, oldest match first.
    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<BloodRequest>, RequestPersistenceError>;

    /// Page through requests, newest first.
    async fn list(
        &self,
        filter: &RequestListFilter,
        page: &PageRequest,
    ) -> Result<Page<BloodRequest>, RequestPersistenceError>;

    /// Persist mutable request fields (patient, hospital, units, urgency,
    /// description, status). Matched donors are managed separately.
    async fn update_details(&self, request: &BloodRequest)
    -> Result<(), RequestPersistenceError>;

    /// Persist a status transition on its own.
    async fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), RequestPersistenceError>;

    /// Add one donor to the matched list. Returns `false` when the donor was
    /// already present; the existing entry is left untouched.
    async fn add_matched_donor(
        &self,
        id: &RequestId,
        entry: &MatchedDonor,
    ) -> Result<bool, RequestPersistenceError>;

    /// Update the progress of one matched donor, if present.
    async fn set_matched_donor_status(
        &self,
        id: &RequestId,
        donor: &UserId,
        status: MatchStatus,
    ) -> Result<(), RequestPersistenceError>;

    /// Delete a request. Returns `false` when it did not exist. Donations
    /// referencing it keep their records with the reference cleared.
    async fn delete(&self, id: &RequestId) -> Result<bool, RequestPersistenceError>;
}
