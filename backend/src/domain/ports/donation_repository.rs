//! Persistence port for donation records.

use async_trait::async_trait;

use super::macros::define_port_error;
use crate::domain::{Donation, DonationId, RequestId, UserId};

define_port_error! {
    /// Failures surfaced by [`DonationRepository`] implementations.
    pub enum DonationPersistenceError {
        /// The backing store could not be reached.
        Connection { message: String } => "donation store unavailable: {message}",
        /// A statement failed to execute.
        Query { message: String } => "donation query failed: {message}",
    }
}

/// Driven port over donation storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Persist a new donation.
    async fn insert(&self, donation: &Donation) -> Result<(), DonationPersistenceError>;

    /// Fetch a donation by id.
    async fn find_by_id(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError>;

    /// All donations reported by one donor, newest first.
    async fn list_by_donor(
        &self,
        donor: &UserId,
    ) -> Result<Vec<Donation>, DonationPersistenceError>;

    /// Number of verified donations recorded against a request.
    async fn count_verified(
        &self,
        request: &RequestId,
    ) -> Result<u64, DonationPersistenceError>;

    /// Set the verified flag, returning the updated donation or `None` when
    /// it does not exist. Verifying an already-verified donation is a no-op
    /// that still returns the record.
    async fn mark_verified(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError>;
}
