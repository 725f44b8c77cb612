//! In-memory port implementations backing the integration tests.
//!
//! These mirror the semantics the SQL adapters promise: idempotent
//! matched-donor adds, over-approximating candidate pre-filters, and
//! case-insensitive location matching.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use uuid::Uuid;

use bloodconnect::domain::ports::{
    CandidateQuery, DonationPersistenceError, DonationRepository, DonorBrowseFilter,
    ExternalIdentity, IdentityError, IdentityProvider, Mailer, MailerError,
    RequestListFilter, RequestPersistenceError, RequestRepository, UserPersistenceError,
    UserRepository,
};
use bloodconnect::domain::{
    BloodRequest, Donation, DonationId, MatchStatus, MatchedDonor, RequestId, User, UserId,
};

/// Mirrors the candidate cap the SQL adapter applies.
pub const CANDIDATE_LIMIT: usize = 50;

fn eq_ignore_case(a: Option<&str>, b: &str) -> bool {
    a.is_some_and(|a| a.eq_ignore_ascii_case(b))
}

fn page_slice<T: Clone>(rows: &[T], page: &PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let items = rows
        .iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.limit() as usize)
        .cloned()
        .collect();
    Page::new(items, page, total)
}

/// User storage over a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn seeded(users: impl IntoIterator<Item = User>) -> Self {
        let rows = users
            .into_iter()
            .map(|user| (*user.id.as_uuid(), user))
            .collect();
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.rows.lock().expect("lock").get(id.as_uuid()).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.lock().expect("lock");
        let duplicate = rows
            .values()
            .any(|row| row.external_id == user.external_id || row.email == user.email);
        if duplicate {
            return Err(UserPersistenceError::duplicate(user.external_id.clone()));
        }
        rows.insert(*user.id.as_uuid(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        self.rows
            .lock()
            .expect("lock")
            .insert(*user.id.as_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.get(id))
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .values()
            .find(|user| user.external_id == external_id)
            .cloned())
    }

    async fn list_donors(
        &self,
        filter: &DonorBrowseFilter,
        page: &PageRequest,
    ) -> Result<Page<User>, UserPersistenceError> {
        let mut donors: Vec<User> = self
            .rows
            .lock()
            .expect("lock")
            .values()
            .filter(|user| user.blood_type.is_some())
            .filter(|user| filter.blood_type.is_none_or(|bt| user.blood_type == Some(bt)))
            .filter(|user| {
                filter
                    .city
                    .as_deref()
                    .is_none_or(|city| eq_ignore_case(user.location.city.as_deref(), city))
            })
            .cloned()
            .collect();
        donors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_slice(&donors, page))
    }

    async fn list_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let mut candidates: Vec<User> = self
            .rows
            .lock()
            .expect("lock")
            .values()
            .filter(|user| {
                user.blood_type
                    .is_some_and(|bt| query.blood_types.contains(&bt))
            })
            .filter(|user| {
                user.is_eligible
                    || user
                        .last_donation
                        .is_none_or(|last| last <= query.eligible_cutoff)
            })
            .filter(|user| match (&query.city, &query.state) {
                (None, None) => true,
                (city, state) => {
                    city.as_deref()
                        .is_some_and(|c| eq_ignore_case(user.location.city.as_deref(), c))
                        || state
                            .as_deref()
                            .is_some_and(|s| eq_ignore_case(user.location.state.as_deref(), s))
                }
            })
            .cloned()
            .collect();
        // Fewest donations first, same tiebreakers as the SQL adapter, so the
        // cap keeps the donors the ranking puts at the top.
        candidates.sort_by(|a, b| {
            a.donation_count
                .cmp(&b.donation_count)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        candidates.truncate(CANDIDATE_LIMIT);
        Ok(candidates)
    }
}

/// Request storage keeping matched donors inline.
#[derive(Default)]
pub struct InMemoryRequests {
    rows: Mutex<HashMap<Uuid, BloodRequest>>,
}

impl InMemoryRequests {
    pub fn get(&self, id: &RequestId) -> Option<BloodRequest> {
        self.rows.lock().expect("lock").get(id.as_uuid()).cloned()
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequests {
    async fn insert(&self, request: &BloodRequest) -> Result<(), RequestPersistenceError> {
        self.rows
            .lock()
            .expect("lock")
            .insert(*request.id.as_uuid(), request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<BloodRequest>, RequestPersistenceError> {
        Ok(self.get(id))
    }

    async fn list(
        &self,
        filter: &RequestListFilter,
        page: &PageRequest,
    ) -> Result<Page<BloodRequest>, RequestPersistenceError> {
        let mut requests: Vec<BloodRequest> = self
            .rows
            .lock()
            .expect("lock")
            .values()
            .filter(|req| {
                filter
                    .blood_type
                    .is_none_or(|bt| req.patient.blood_type == bt)
            })
            .filter(|req| filter.urgency.is_none_or(|u| req.urgency == u))
            .filter(|req| filter.status.is_none_or(|s| req.status == s))
            .filter(|req| {
                filter
                    .city
                    .as_deref()
                    .is_none_or(|city| eq_ignore_case(req.hospital.city.as_deref(), city))
            })
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_slice(&requests, page))
    }

    async fn update_details(
        &self,
        request: &BloodRequest,
    ) -> Result<(), RequestPersistenceError> {
        let mut rows = self.rows.lock().expect("lock");
        if let Some(row) = rows.get_mut(request.id.as_uuid()) {
            let matched = std::mem::take(&mut row.matched_donors);
            *row = request.clone();
            row.matched_donors = matched;
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: &RequestId,
        status: bloodconnect::domain::RequestStatus,
    ) -> Result<(), RequestPersistenceError> {
        if let Some(row) = self.rows.lock().expect("lock").get_mut(id.as_uuid()) {
            row.status = status;
            row.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn add_matched_donor(
        &self,
        id: &RequestId,
        entry: &MatchedDonor,
    ) -> Result<bool, RequestPersistenceError> {
        let mut rows = self.rows.lock().expect("lock");
        let Some(row) = rows.get_mut(id.as_uuid()) else {
            return Ok(false);
        };
        if row.matched_donors.iter().any(|m| m.donor == entry.donor) {
            return Ok(false);
        }
        row.matched_donors.push(entry.clone());
        row.updated_at = entry.matched_at;
        Ok(true)
    }

    async fn set_matched_donor_status(
        &self,
        id: &RequestId,
        donor: &UserId,
        status: MatchStatus,
    ) -> Result<(), RequestPersistenceError> {
        if let Some(row) = self.rows.lock().expect("lock").get_mut(id.as_uuid())
            && let Some(entry) = row.matched_donors.iter_mut().find(|m| m.donor == *donor)
        {
            entry.status = status;
        }
        Ok(())
    }

    async fn delete(&self, id: &RequestId) -> Result<bool, RequestPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .remove(id.as_uuid())
            .is_some())
    }
}

/// Donation storage over a mutex-guarded vector.
#[derive(Default)]
pub struct InMemoryDonations {
    rows: Mutex<Vec<Donation>>,
}

#[async_trait]
impl DonationRepository for InMemoryDonations {
    async fn insert(&self, donation: &Donation) -> Result<(), DonationPersistenceError> {
        self.rows.lock().expect("lock").push(donation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .iter()
            .find(|d| d.id == *id)
            .cloned())
    }

    async fn list_by_donor(
        &self,
        donor: &UserId,
    ) -> Result<Vec<Donation>, DonationPersistenceError> {
        let mut donations: Vec<Donation> = self
            .rows
            .lock()
            .expect("lock")
            .iter()
            .filter(|d| d.donor == *donor)
            .cloned()
            .collect();
        donations.sort_by(|a, b| b.donation_date.cmp(&a.donation_date));
        Ok(donations)
    }

    async fn count_verified(
        &self,
        request: &RequestId,
    ) -> Result<u64, DonationPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .iter()
            .filter(|d| d.verified && d.request == Some(*request))
            .count() as u64)
    }

    async fn mark_verified(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError> {
        let mut rows = self.rows.lock().expect("lock");
        let Some(donation) = rows.iter_mut().find(|d| d.id == *id) else {
            return Ok(None);
        };
        donation.verified = true;
        Ok(Some(donation.clone()))
    }
}

/// Mailer recording template names instead of sending anything.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("lock").clone()
    }

    fn record(&self, template: &str, to: &User) {
        self.sent
            .lock()
            .expect("lock")
            .push(format!("{template}:{}", to.email));
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn welcome(&self, user: &User) -> Result<(), MailerError> {
        self.record("welcome", user);
        Ok(())
    }

    async fn request_confirmation(
        &self,
        requester: &User,
        _request: &BloodRequest,
    ) -> Result<(), MailerError> {
        self.record("request-confirmation", requester);
        Ok(())
    }

    async fn donor_match(&self, donor: &User, _request: &BloodRequest) -> Result<(), MailerError> {
        self.record("donor-match", donor);
        Ok(())
    }

    async fn requester_notification(
        &self,
        requester: &User,
        _request: &BloodRequest,
        _donor: &User,
    ) -> Result<(), MailerError> {
        self.record("requester-notification", requester);
        Ok(())
    }
}

/// Identity provider answering from a fixed token table.
#[derive(Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, ExternalIdentity>,
}

impl StaticIdentityProvider {
    pub fn with_token(
        mut self,
        token: impl Into<String>,
        subject: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.tokens.insert(
            token.into(),
            ExternalIdentity {
                subject: subject.into(),
                email: email.into(),
                name: None,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify_bearer(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(IdentityError::invalid_token)
    }
}
