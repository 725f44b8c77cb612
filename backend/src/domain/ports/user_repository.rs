//! Persistence port for user accounts and donor lookups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use super::macros::define_port_error;
use crate::domain::{BloodType, User, UserId};

define_port_error! {
    /// Failures surfaced by [`UserRepository`] implementations.
    pub enum UserPersistenceError {
        /// The backing store could not be reached.
        Connection { message: String } => "user store unavailable: {message}",
        /// A statement failed to execute.
        Query { message: String } => "user query failed: {message}",
        /// A unique constraint on `external_id` or `email` fired.
        Duplicate { message: String } => "duplicate user: {message}",
    }
}

/// Filter applied when browsing the donor directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorBrowseFilter {
    /// Only donors with exactly this blood type.
    pub blood_type: Option<BloodType>,
    /// Case-insensitive city match.
    pub city: Option<String>,
}

/// Pre-filter for candidate donors, pushed down to the store.
///
/// The store may over-approximate (for example on eligibility, where the
/// denormalised flag can lag); [`crate::domain::matching`] re-checks every
/// row it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    /// Acceptable donor blood types for the recipient.
    pub blood_types: Vec<BloodType>,
    /// Restrict to this city; with `state` also unset the filter is off.
    pub city: Option<String>,
    /// State paired with `city`; either match qualifies.
    pub state: Option<String>,
    /// Donations on or before this instant no longer block eligibility.
    pub eligible_cutoff: DateTime<Utc>,
}

/// Driven port over user storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Persist changes to an existing user.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by internal id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by the identity provider's subject.
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Page through users with a blood type on record.
    async fn list_donors(
        &self,
        filter: &DonorBrowseFilter,
        page: &PageRequest,
    ) -> Result<Page<User>, UserPersistenceError>;

    /// Donors plausibly able to answer a request, fewest donations first.
    ///
    /// Implementations may cap the result; the cap must keep the
    /// least-donating donors.
    async fn list_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<User>, UserPersistenceError>;
}
