//! Request lifecycle and donor-matching services.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Months, Utc};
use pagination::{Page, PageRequest};
use tracing::warn;

use super::matching::{self, LocationFilter};
use super::ports::{
    CandidateQuery, Mailer, MatchingService, NewRequest, RequestListFilter,
    RequestPersistenceError, RequestRepository, RequestUpdate, RequestsService,
    UserPersistenceError, UserRepository,
};
use super::{
    BloodRequest, ELIGIBILITY_COOLDOWN_MONTHS, Error, MatchStatus, MatchedDonor, RequestId,
    RequestStatus, User,
};

fn map_requests_error(err: RequestPersistenceError) -> Error {
    match err {
        RequestPersistenceError::Connection { .. } => {
            warn!(error = %err, "request store unreachable");
            Error::service_unavailable("request store unavailable")
        }
        RequestPersistenceError::Query { .. } => {
            warn!(error = %err, "request store query failed");
            Error::internal("request store failure")
        }
    }
}

fn map_candidate_users_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { .. } => {
            warn!(error = %err, "user store unreachable");
            Error::service_unavailable("user store unavailable")
        }
        _ => {
            warn!(error = %err, "candidate lookup failed");
            Error::internal("user store failure")
        }
    }
}

fn ensure_modifiable(request: &BloodRequest) -> Result<(), Error> {
    match request.status {
        RequestStatus::Open | RequestStatus::InProgress => Ok(()),
        RequestStatus::Fulfilled | RequestStatus::Closed => Err(Error::conflict(
            "request is no longer open",
        )),
    }
}

/// Concrete [`RequestsService`] over a request repository and a mailer.
pub struct RequestService<R, M> {
    requests: Arc<R>,
    mailer: Arc<M>,
}

impl<R, M> RequestService<R, M> {
    /// Wire the service to its collaborators.
    pub fn new(requests: Arc<R>, mailer: Arc<M>) -> Self {
        Self { requests, mailer }
    }
}

impl<R: RequestRepository, M> RequestService<R, M> {
    async fn load_owned(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error> {
        let request = self
            .requests
            .find_by_id(id)
            .await
            .map_err(map_requests_error)?
            .ok_or_else(|| Error::not_found("request not found"))?;
        if !request.is_owned_by(&caller.id) {
            return Err(Error::forbidden(
                "only the requester may modify this request",
            ));
        }
        Ok(request)
    }
}

#[async_trait]
impl<R, M> RequestsService for RequestService<R, M>
where
    R: RequestRepository,
    M: Mailer,
{
    async fn create(&self, requester: &User, input: NewRequest) -> Result<BloodRequest, Error> {
        let request = BloodRequest::new(
            requester.id,
            input.patient,
            input.hospital,
            input.units_needed,
            input.urgency,
            input.description,
        );
        self.requests
            .insert(&request)
            .await
            .map_err(map_requests_error)?;
        if let Err(err) = self.mailer.request_confirmation(requester, &request).await {
            warn!(request = %request.id, error = %err, "confirmation mail failed");
        }
        Ok(request)
    }

    async fn list(
        &self,
        filter: RequestListFilter,
        page: PageRequest,
    ) -> Result<Page<BloodRequest>, Error> {
        self.requests
            .list(&filter, &page)
            .await
            .map_err(map_requests_error)
    }

    async fn get(&self, id: &RequestId) -> Result<BloodRequest, Error> {
        self.requests
            .find_by_id(id)
            .await
            .map_err(map_requests_error)?
            .ok_or_else(|| Error::not_found("request not found"))
    }

    async fn update(
        &self,
        caller: &User,
        id: &RequestId,
        changes: RequestUpdate,
    ) -> Result<BloodRequest, Error> {
        let mut request = self.load_owned(caller, id).await?;
        ensure_modifiable(&request)?;
        if let Some(hospital) = changes.hospital {
            request.hospital = hospital;
        }
        if let Some(units_needed) = changes.units_needed {
            request.units_needed = units_needed;
        }
        if let Some(urgency) = changes.urgency {
            request.urgency = urgency;
        }
        if let Some(description) = changes.description {
            request.description = Some(description);
        }
        request.updated_at = Utc::now();
        self.requests
            .update_details(&request)
            .await
            .map_err(map_requests_error)?;
        Ok(request)
    }

    async fn cancel(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error> {
        let mut request = self.load_owned(caller, id).await?;
        request.cancel(Utc::now())?;
        self.requests
            .set_status(id, request.status)
            .await
            .map_err(map_requests_error)?;
        Ok(request)
    }

    async fn delete(&self, caller: &User, id: &RequestId) -> Result<(), Error> {
        self.load_owned(caller, id).await?;
        self.requests
            .delete(id)
            .await
            .map_err(map_requests_error)?;
        Ok(())
    }
}

/// Concrete [`MatchingService`] joining requests against the donor pool.
pub struct MatchService<R, U, M> {
    requests: Arc<R>,
    users: Arc<U>,
    mailer: Arc<M>,
}

impl<R, U, M> MatchService<R, U, M> {
    /// Wire the service to its collaborators.
    pub fn new(requests: Arc<R>, users: Arc<U>, mailer: Arc<M>) -> Self {
        Self {
            requests,
            users,
            mailer,
        }
    }
}

impl<R, U, M> MatchService<R, U, M>
where
    R: RequestRepository,
    U: UserRepository,
{
    async fn load(&self, id: &RequestId) -> Result<BloodRequest, Error> {
        self.requests
            .find_by_id(id)
            .await
            .map_err(map_requests_error)?
            .ok_or_else(|| Error::not_found("request not found"))
    }

    /// Candidates for `request`, pre-filtered in the store and re-checked
    /// against the matching rules.
    async fn candidates_for(
        &self,
        request: &BloodRequest,
        filter: LocationFilter,
    ) -> Result<Vec<User>, Error> {
        let now = Utc::now();
        let cutoff = now
            .checked_sub_months(Months::new(ELIGIBILITY_COOLDOWN_MONTHS))
            .unwrap_or(now);
        let (city, state) = if filter.near_hospital {
            (request.hospital.city.clone(), request.hospital.state.clone())
        } else {
            (None, None)
        };
        let query = CandidateQuery {
            blood_types: request.patient.blood_type.compatible_donors().to_vec(),
            city,
            state,
            eligible_cutoff: cutoff,
        };
        let rows = self
            .users
            .list_candidates(&query)
            .await
            .map_err(map_candidate_users_error)?;
        Ok(matching::candidate_donors(request, rows, now, filter))
    }
}

#[async_trait]
impl<R, U, M> MatchingService for MatchService<R, U, M>
where
    R: RequestRepository,
    U: UserRepository,
    M: Mailer,
{
    async fn candidates(
        &self,
        id: &RequestId,
        filter: LocationFilter,
    ) -> Result<Vec<User>, Error> {
        let request = self.load(id).await?;
        self.candidates_for(&request, filter).await
    }

    async fn match_donors(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error> {
        let request = self.load(id).await?;
        if !request.is_owned_by(&caller.id) {
            return Err(Error::forbidden(
                "only the requester may match donors to this request",
            ));
        }
        ensure_modifiable(&request)?;

        let candidates = self.candidates_for(&request, LocationFilter::default()).await?;
        let now = Utc::now();
        let mut any_added = false;
        for donor in &candidates {
            let entry = MatchedDonor {
                donor: donor.id,
                status: MatchStatus::Matched,
                matched_at: now,
            };
            let added = self
                .requests
                .add_matched_donor(id, &entry)
                .await
                .map_err(map_requests_error)?;
            if added {
                any_added = true;
                if let Err(err) = self.mailer.donor_match(donor, &request).await {
                    warn!(request = %request.id, donor = %donor.id, error = %err, "match mail failed");
                }
            }
        }
        if any_added && request.status == RequestStatus::Open {
            self.requests
                .set_status(id, RequestStatus::InProgress)
                .await
                .map_err(map_requests_error)?;
        }
        self.load(id).await
    }

    async fn volunteer(&self, caller: &User, id: &RequestId) -> Result<BloodRequest, Error> {
        let request = self.load(id).await?;
        if request.is_owned_by(&caller.id) {
            return Err(Error::invalid_request(
                "you cannot volunteer for your own request",
            ));
        }
        ensure_modifiable(&request)?;
        let now = Utc::now();
        if !matching::is_candidate(&request, caller, now, LocationFilter::default()) {
            return Err(Error::invalid_request(
                "you are not an eligible match for this request",
            ));
        }

        let entry = MatchedDonor {
            donor: caller.id,
            status: MatchStatus::Matched,
            matched_at: now,
        };
        let added = self
            .requests
            .add_matched_donor(id, &entry)
            .await
            .map_err(map_requests_error)?;
        if added {
            if request.status == RequestStatus::Open {
                self.requests
                    .set_status(id, RequestStatus::InProgress)
                    .await
                    .map_err(map_requests_error)?;
            }
            match self.users.find_by_id(&request.requester).await {
                Ok(Some(requester)) => {
                    if let Err(err) = self
                        .mailer
                        .requester_notification(&requester, &request, caller)
                        .await
                    {
                        warn!(request = %request.id, error = %err, "volunteer mail failed");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(request = %request.id, error = %err, "requester lookup for mail failed");
                }
            }
        }
        self.load(id).await
    }
}
