//! Diesel-backed implementation of the donation persistence port.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::DonationRow;
use super::pool::{DbPool, PoolError};
use super::schema::donations;
use crate::domain::ports::{DonationPersistenceError, DonationRepository};
use crate::domain::{Donation, DonationId, RequestId, UserId};

fn map_pool_error(err: PoolError) -> DonationPersistenceError {
    DonationPersistenceError::connection(err.to_string())
}

fn map_diesel_error(err: diesel::result::Error) -> DonationPersistenceError {
    DonationPersistenceError::query(err.to_string())
}

/// [`DonationRepository`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct DieselDonationRepository {
    pool: DbPool,
}

impl DieselDonationRepository {
    /// Create a repository sharing `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationRepository for DieselDonationRepository {
    async fn insert(&self, donation: &Donation) -> Result<(), DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(donations::table)
            .values(DonationRow::from_domain(donation))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = donations::table
            .find(*id.as_uuid())
            .select(DonationRow::as_select())
            .first::<DonationRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(DonationRow::into_domain))
    }

    async fn list_by_donor(
        &self,
        donor: &UserId,
    ) -> Result<Vec<Donation>, DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = donations::table
            .filter(donations::donor_id.eq(*donor.as_uuid()))
            .select(DonationRow::as_select())
            .order(donations::donation_date.desc())
            .load::<DonationRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(DonationRow::into_domain).collect())
    }

    async fn count_verified(
        &self,
        request: &RequestId,
    ) -> Result<u64, DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = donations::table
            .filter(donations::request_id.eq(*request.as_uuid()))
            .filter(donations::verified.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn mark_verified(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(donations::table.find(*id.as_uuid()))
            .set(donations::verified.eq(true))
            .returning(DonationRow::as_returning())
            .get_result::<DonationRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(DonationRow::into_domain))
    }
}
