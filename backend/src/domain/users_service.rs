//! Account service: bearer authentication, profiles, and the donor
//! directory.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pagination::{Page, PageRequest};
use tracing::warn;

use super::ports::{
    DonorBrowseFilter, IdentityError, IdentityProvider, Mailer, ProfileUpdate, UserPersistenceError,
    UserRepository, UsersService,
};
use super::{Error, User, UserId};

fn map_users_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { .. } => {
            warn!(error = %err, "user store unreachable");
            Error::service_unavailable("user store unavailable")
        }
        UserPersistenceError::Query { .. } | UserPersistenceError::Duplicate { .. } => {
            warn!(error = %err, "user store query failed");
            Error::internal("user store failure")
        }
    }
}

/// Default display name for identities that arrive without one.
fn name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_owned()
}

/// Concrete [`UsersService`] over a user repository, an identity provider,
/// and a mailer.
pub struct UserService<U, I, M> {
    users: Arc<U>,
    identity: Arc<I>,
    mailer: Arc<M>,
}

impl<U, I, M> UserService<U, I, M> {
    /// Wire the service to its collaborators.
    pub fn new(users: Arc<U>, identity: Arc<I>, mailer: Arc<M>) -> Self {
        Self {
            users,
            identity,
            mailer,
        }
    }
}

#[async_trait]
impl<U, I, M> UsersService for UserService<U, I, M>
where
    U: UserRepository,
    I: IdentityProvider,
    M: Mailer,
{
    async fn authenticate_bearer(&self, token: &str) -> Result<User, Error> {
        let claims = self.identity.verify_bearer(token).await.map_err(|err| match err {
            IdentityError::InvalidToken => Error::unauthorized("invalid or expired bearer token"),
            IdentityError::Unavailable { .. } => {
                warn!(error = %err, "identity provider unreachable");
                Error::service_unavailable("identity provider unavailable")
            }
        })?;

        if let Some(user) = self
            .users
            .find_by_external_id(&claims.subject)
            .await
            .map_err(map_users_error)?
        {
            return Ok(user);
        }

        let name = claims
            .name
            .clone()
            .unwrap_or_else(|| name_from_email(&claims.email));
        let user = User::new(claims.subject, claims.email, name);
        match self.users.insert(&user).await {
            Ok(()) => {
                if let Err(err) = self.mailer.welcome(&user).await {
                    warn!(user = %user.id, error = %err, "welcome mail failed");
                }
                Ok(user)
            }
            // Lost a first-sight race with a concurrent request for the same
            // identity; the row that won is the account.
            Err(UserPersistenceError::Duplicate { .. }) => self
                .users
                .find_by_external_id(&user.external_id)
                .await
                .map_err(map_users_error)?
                .ok_or_else(|| Error::internal("user missing after duplicate insert")),
            Err(err) => Err(map_users_error(err)),
        }
    }

    async fn get_profile(&self, id: &UserId) -> Result<User, Error> {
        let mut user = self
            .users
            .find_by_id(id)
            .await
            .map_err(map_users_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;
        if user.refresh_eligibility(Utc::now()) {
            // Stale flag repair is opportunistic; the read still succeeds if
            // the write does not.
            if let Err(err) = self.users.update(&user).await {
                warn!(user = %user.id, error = %err, "eligibility refresh not persisted");
            }
        }
        Ok(user)
    }

    async fn update_profile(&self, id: &UserId, changes: ProfileUpdate) -> Result<User, Error> {
        let mut user = self
            .users
            .find_by_id(id)
            .await
            .map_err(map_users_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(blood_type) = changes.blood_type {
            user.blood_type = Some(blood_type);
        }
        if let Some(location) = changes.location {
            user.location = location;
        }
        user.updated_at = Utc::now();
        self.users.update(&user).await.map_err(map_users_error)?;
        Ok(user)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_users_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn browse_donors(
        &self,
        filter: DonorBrowseFilter,
        page: PageRequest,
    ) -> Result<Page<User>, Error> {
        self.users
            .list_donors(&filter, &page)
            .await
            .map_err(map_users_error)
    }
}
