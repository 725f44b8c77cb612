//! Diesel-backed implementation of the user persistence port.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;
use crate::domain::ports::{
    CandidateQuery, DonorBrowseFilter, UserPersistenceError, UserRepository,
};
use crate::domain::{User, UserId};

/// Upper bound on candidate rows handed to the matching pass.
const MAX_CANDIDATES: i64 = 50;

fn map_pool_error(err: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(err.to_string())
}

fn map_diesel_error(err: diesel::result::Error) -> UserPersistenceError {
    match err {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            UserPersistenceError::duplicate(info.message().to_owned())
        }
        other => UserPersistenceError::query(other.to_string()),
    }
}

fn donor_query<'a>(filter: &DonorBrowseFilter) -> users::BoxedQuery<'a, diesel::pg::Pg> {
    let mut query = users::table
        .filter(users::blood_type.is_not_null())
        .into_boxed();
    if let Some(blood_type) = filter.blood_type {
        query = query.filter(users::blood_type.eq(blood_type.as_str()));
    }
    if let Some(city) = &filter.city {
        query = query.filter(users::city.ilike(city.clone()));
    }
    query
}

/// [`UserRepository`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository sharing `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(UserRow::from_domain(user))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(*user.id.as_uuid()))
            .set(UserRow::from_domain(user))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(UserRow::into_domain))
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::external_id.eq(external_id))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(UserRow::into_domain))
    }

    async fn list_donors(
        &self,
        filter: &DonorBrowseFilter,
        page: &PageRequest,
    ) -> Result<Page<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = donor_query(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows = donor_query(filter)
            .select(UserRow::as_select())
            .order(users::name.asc())
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(page.limit()))
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows.into_iter().map(UserRow::into_domain).collect();
        Ok(Page::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn list_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let blood_types: Vec<&str> = query
            .blood_types
            .iter()
            .map(|blood_type| blood_type.as_str())
            .collect();
        let mut candidates = users::table
            .filter(users::blood_type.eq_any(blood_types))
            // Over-approximates on purpose: the stored flag may lag behind the
            // cutoff rule, so rows are re-checked in memory by the caller.
            .filter(
                users::is_eligible
                    .eq(true)
                    .or(users::last_donation.is_null())
                    .or(users::last_donation.le(query.eligible_cutoff)),
            )
            .into_boxed();
        match (&query.city, &query.state) {
            (Some(city), Some(state)) => {
                candidates = candidates
                    .filter(users::city.ilike(city.clone()).or(users::state.ilike(state.clone())));
            }
            (Some(city), None) => {
                candidates = candidates.filter(users::city.ilike(city.clone()));
            }
            (None, Some(state)) => {
                candidates = candidates.filter(users::state.ilike(state.clone()));
            }
            (None, None) => {}
        }
        // Fewest donations first, so truncation never drops the donors the
        // ranking puts at the top. Tiebreakers match the in-memory sort.
        let rows = candidates
            .select(UserRow::as_select())
            .order((
                users::donation_count.asc(),
                users::created_at.asc(),
                users::id.asc(),
            ))
            .limit(MAX_CANDIDATES)
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(UserRow::into_domain).collect())
    }
}
