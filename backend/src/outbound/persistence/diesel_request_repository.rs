//! Diesel-backed implementation of the request persistence port.
//!
//! Matched donors live in their own table keyed by `(request_id, donor_id)`;
//! the unique key makes concurrent adds collapse into one row without any
//! read-modify-write cycle.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};
use uuid::Uuid;

use super::models::{MatchedDonorRow, RequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::{blood_requests, matched_donors};
use crate::domain::ports::{
    RequestListFilter, RequestPersistenceError, RequestRepository,
};
use crate::domain::{
    BloodRequest, MatchStatus, MatchedDonor, RequestId, RequestStatus, UserId,
};

fn map_pool_error(err: PoolError) -> RequestPersistenceError {
    RequestPersistenceError::connection(err.to_string())
}

fn map_diesel_error(err: diesel::result::Error) -> RequestPersistenceError {
    RequestPersistenceError::query(err.to_string())
}

fn request_query<'a>(
    filter: &RequestListFilter,
) -> blood_requests::BoxedQuery<'a, diesel::pg::Pg> {
    let mut query = blood_requests::table.into_boxed();
    if let Some(blood_type) = filter.blood_type {
        query = query.filter(blood_requests::patient_blood_type.eq(blood_type.as_str()));
    }
    if let Some(urgency) = filter.urgency {
        query = query.filter(blood_requests::urgency.eq(urgency.as_str()));
    }
    if let Some(status) = filter.status {
        query = query.filter(blood_requests::status.eq(status.as_str()));
    }
    if let Some(city) = &filter.city {
        query = query.filter(blood_requests::hospital_city.ilike(city.clone()));
    }
    query
}

/// [`RequestRepository`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct DieselRequestRepository {
    pool: DbPool,
}

impl DieselRequestRepository {
    /// Create a repository sharing `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for DieselRequestRepository {
    async fn insert(&self, request: &BloodRequest) -> Result<(), RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(blood_requests::table)
            .values(RequestRow::from_domain(request))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<BloodRequest>, RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = blood_requests::table
            .find(*id.as_uuid())
            .select(RequestRow::as_select())
            .first::<RequestRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let matches = matched_donors::table
            .filter(matched_donors::request_id.eq(*id.as_uuid()))
            .select(MatchedDonorRow::as_select())
            .order(matched_donors::matched_at.asc())
            .load::<MatchedDonorRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let matches = matches.into_iter().map(MatchedDonorRow::into_domain).collect();
        Ok(Some(row.into_domain(matches)))
    }

    async fn list(
        &self,
        filter: &RequestListFilter,
        page: &PageRequest,
    ) -> Result<Page<BloodRequest>, RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = request_query(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows = request_query(filter)
            .select(RequestRow::as_select())
            .order(blood_requests::created_at.desc())
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(page.limit()))
            .load::<RequestRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let match_rows = matched_donors::table
            .filter(matched_donors::request_id.eq_any(ids))
            .select(MatchedDonorRow::as_select())
            .order(matched_donors::matched_at.asc())
            .load::<MatchedDonorRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let mut by_request: HashMap<Uuid, Vec<MatchedDonor>> = HashMap::new();
        for match_row in match_rows {
            by_request
                .entry(match_row.request_id)
                .or_default()
                .push(match_row.into_domain());
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let matches = by_request.remove(&row.id).unwrap_or_default();
                row.into_domain(matches)
            })
            .collect();
        Ok(Page::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn update_details(
        &self,
        request: &BloodRequest,
    ) -> Result<(), RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(blood_requests::table.find(*request.id.as_uuid()))
            .set(RequestRow::from_domain(request))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(blood_requests::table.find(*id.as_uuid()))
            .set((
                blood_requests::status.eq(status.as_str()),
                blood_requests::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn add_matched_donor(
        &self,
        id: &RequestId,
        entry: &MatchedDonor,
    ) -> Result<bool, RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(matched_donors::table)
            .values(MatchedDonorRow::from_domain(id, entry))
            .on_conflict((matched_donors::request_id, matched_donors::donor_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if inserted == 1 {
            diesel::update(blood_requests::table.find(*id.as_uuid()))
                .set(blood_requests::updated_at.eq(entry.matched_at))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        }
        Ok(inserted == 1)
    }

    async fn set_matched_donor_status(
        &self,
        id: &RequestId,
        donor: &UserId,
        status: MatchStatus,
    ) -> Result<(), RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            matched_donors::table
                .filter(matched_donors::request_id.eq(*id.as_uuid()))
                .filter(matched_donors::donor_id.eq(*donor.as_uuid())),
        )
        .set(matched_donors::status.eq(status.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn delete(&self, id: &RequestId) -> Result<bool, RequestPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Matched donors go with the request via ON DELETE CASCADE; donations
        // keep their rows with the back-reference nulled.
        let deleted = diesel::delete(blood_requests::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn database_errors_map_to_query() {
        assert!(matches!(
            map_diesel_error(diesel::result::Error::NotFound),
            RequestPersistenceError::Query { .. }
        ));
    }

    #[rstest]
    fn pool_failures_map_to_connection() {
        assert!(matches!(
            map_pool_error(PoolError::build("bad url")),
            RequestPersistenceError::Connection { .. }
        ));
    }
}
