//! Shared application state handed to HTTP handlers.

use std::sync::Arc;

use crate::domain::ports::{DonationsService, MatchingService, RequestsService, UsersService};

/// Handler-facing service handles; cheap to clone.
#[derive(Clone)]
pub struct HttpState {
    /// Accounts, profiles, and the donor directory.
    pub users: Arc<dyn UsersService>,
    /// Blood-request lifecycle.
    pub requests: Arc<dyn RequestsService>,
    /// Donor matching.
    pub matching: Arc<dyn MatchingService>,
    /// Donation recording and verification.
    pub donations: Arc<dyn DonationsService>,
}

impl HttpState {
    /// Bundle the service handles.
    pub fn new(
        users: Arc<dyn UsersService>,
        requests: Arc<dyn RequestsService>,
        matching: Arc<dyn MatchingService>,
        donations: Arc<dyn DonationsService>,
    ) -> Self {
        Self {
            users,
            requests,
            matching,
            donations,
        }
    }
}
