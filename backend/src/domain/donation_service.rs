//! Donation recording and verification.
//!
//! Recording a donation triggers three follow-up writes: the donor's
//! counters, the matched-donor entry on the referenced request, and the
//! request fulfilment tally. All three are best effort. The donation itself
//! is the durable record; a failed follow-up is logged and repaired by the
//! next recomputation rather than failing the call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use super::ports::{
    DonationPersistenceError, DonationRepository, DonationsService, NewDonation,
    RequestRepository, UserRepository,
};
use super::{
    Donation, DonationId, Error, MatchStatus, MatchedDonor, RequestId, RequestStatus, User,
    UserId,
};

fn map_donations_error(err: DonationPersistenceError) -> Error {
    match err {
        DonationPersistenceError::Connection { .. } => {
            warn!(error = %err, "donation store unreachable");
            Error::service_unavailable("donation store unavailable")
        }
        DonationPersistenceError::Query { .. } => {
            warn!(error = %err, "donation store query failed");
            Error::internal("donation store failure")
        }
    }
}

/// Concrete [`DonationsService`] over the three repositories.
pub struct DonationService<D, R, U> {
    donations: Arc<D>,
    requests: Arc<R>,
    users: Arc<U>,
}

impl<D, R, U> DonationService<D, R, U> {
    /// Wire the service to its collaborators.
    pub fn new(donations: Arc<D>, requests: Arc<R>, users: Arc<U>) -> Self {
        Self {
            donations,
            requests,
            users,
        }
    }
}

impl<D, R, U> DonationService<D, R, U>
where
    D: DonationRepository,
    R: RequestRepository,
    U: UserRepository,
{
    /// Bump the donor's counters after a recorded donation. Best effort.
    async fn apply_donor_side_effects(&self, donor_id: &UserId, donation: &Donation) {
        let donor = match self.users.find_by_id(donor_id).await {
            Ok(Some(donor)) => donor,
            Ok(None) => {
                warn!(donation = %donation.id, donor = %donor_id, "donor missing for counter update");
                return;
            }
            Err(err) => {
                warn!(donation = %donation.id, error = %err, "donor reload failed");
                return;
            }
        };
        let mut donor = donor;
        donor.record_donation(donation.donation_date);
        if let Err(err) = self.users.update(&donor).await {
            warn!(donation = %donation.id, donor = %donor.id, error = %err, "donor counters not persisted");
        }
    }

    /// Record the donor against the referenced request with status
    /// `donated`. Best effort.
    async fn apply_match_side_effects(&self, request_id: &RequestId, donation: &Donation) {
        let entry = MatchedDonor {
            donor: donation.donor,
            status: MatchStatus::Donated,
            matched_at: donation.donation_date,
        };
        match self.requests.add_matched_donor(request_id, &entry).await {
            Ok(true) => {
                let status = self
                    .requests
                    .find_by_id(request_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|request| request.status);
                if status == Some(RequestStatus::Open) {
                    if let Err(err) = self
                        .requests
                        .set_status(request_id, RequestStatus::InProgress)
                        .await
                    {
                        warn!(request = %request_id, error = %err, "status bump not persisted");
                    }
                }
            }
            Ok(false) => {
                // Already matched; promote the existing entry.
                if let Err(err) = self
                    .requests
                    .set_matched_donor_status(request_id, &donation.donor, MatchStatus::Donated)
                    .await
                {
                    warn!(request = %request_id, donor = %donation.donor, error = %err, "match status not persisted");
                }
            }
            Err(err) => {
                warn!(request = %request_id, donor = %donation.donor, error = %err, "matched donor not persisted");
            }
        }
    }

    /// Re-derive the fulfilment state of a request from its verified tally.
    /// Best effort.
    async fn recompute_fulfilment(&self, request_id: &RequestId) {
        let verified = match self.donations.count_verified(request_id).await {
            Ok(count) => count,
            Err(err) => {
                warn!(request = %request_id, error = %err, "verified tally unavailable");
                return;
            }
        };
        let request = match self.requests.find_by_id(request_id).await {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(err) => {
                warn!(request = %request_id, error = %err, "request reload failed");
                return;
            }
        };
        let mut request = request;
        if request.apply_verified_tally(verified, Utc::now()) {
            if let Err(err) = self.requests.set_status(request_id, request.status).await {
                warn!(request = %request_id, error = %err, "fulfilment not persisted");
            }
        }
    }
}

#[async_trait]
impl<D, R, U> DonationsService for DonationService<D, R, U>
where
    D: DonationRepository,
    R: RequestRepository,
    U: UserRepository,
{
    async fn record(&self, donor: &User, input: NewDonation) -> Result<Donation, Error> {
        if !donor.eligible_at(Utc::now()) {
            return Err(Error::invalid_request(
                "you are not eligible to donate yet",
            ));
        }
        if let Some(request_id) = input.request {
            let exists = self
                .requests
                .find_by_id(&request_id)
                .await
                .map_err(|err| {
                    warn!(error = %err, "request lookup failed");
                    Error::internal("request store failure")
                })?
                .is_some();
            if !exists {
                return Err(Error::not_found("request not found"));
            }
        }

        let mut donation = Donation::new(donor.id, input.request, input.hospital, input.units)
            .with_notes(input.notes);
        if let Some(at) = input.donation_date {
            donation = donation.with_donation_date(at);
        }
        self.donations
            .insert(&donation)
            .await
            .map_err(map_donations_error)?;

        self.apply_donor_side_effects(&donor.id, &donation).await;
        if let Some(request_id) = donation.request {
            self.apply_match_side_effects(&request_id, &donation).await;
            self.recompute_fulfilment(&request_id).await;
        }
        Ok(donation)
    }

    async fn my_donations(&self, donor: &UserId) -> Result<Vec<Donation>, Error> {
        self.donations
            .list_by_donor(donor)
            .await
            .map_err(map_donations_error)
    }

    async fn get(&self, caller: &User, id: &DonationId) -> Result<Donation, Error> {
        let donation = self
            .donations
            .find_by_id(id)
            .await
            .map_err(map_donations_error)?
            .ok_or_else(|| Error::not_found("donation not found"))?;
        if donation.donor != caller.id && !caller.is_admin {
            return Err(Error::forbidden("donations are visible to their donor only"));
        }
        Ok(donation)
    }

    async fn verify(&self, caller: &User, id: &DonationId) -> Result<Donation, Error> {
        if !caller.is_admin {
            return Err(Error::forbidden("administrator access required"));
        }
        let donation = self
            .donations
            .mark_verified(id)
            .await
            .map_err(map_donations_error)?
            .ok_or_else(|| Error::not_found("donation not found"))?;
        if let Some(request_id) = donation.request {
            self.recompute_fulfilment(&request_id).await;
        }
        Ok(donation)
    }
}
