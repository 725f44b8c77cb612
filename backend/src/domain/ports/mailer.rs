//! Outbound notification port.
//!
//! Mail is strictly best effort: services log and swallow every
//! [`MailerError`], so a broken mail gateway never fails a write.

use async_trait::async_trait;

use super::macros::define_port_error;
use crate::domain::{BloodRequest, User};

define_port_error! {
    /// Failures surfaced by [`Mailer`] implementations.
    pub enum MailerError {
        /// The message could not be handed to the gateway.
        Send { message: String } => "mail delivery failed: {message}",
    }
}

/// Driven port for user-facing notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Greet a user on their first appearance.
    async fn welcome(&self, user: &User) -> Result<(), MailerError>;

    /// Confirm a newly created request to its owner.
    async fn request_confirmation(
        &self,
        requester: &User,
        request: &BloodRequest,
    ) -> Result<(), MailerError>;

    /// Tell a donor they have been matched to a request.
    async fn donor_match(&self, donor: &User, request: &BloodRequest) -> Result<(), MailerError>;

    /// Tell a requester a donor volunteered for their request.
    async fn requester_notification(
        &self,
        requester: &User,
        request: &BloodRequest,
        donor: &User,
    ) -> Result<(), MailerError>;
}

/// Mailer that drops everything; used by tests and local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn welcome(&self, _user: &User) -> Result<(), MailerError> {
        Ok(())
    }

    async fn request_confirmation(
        &self,
        _requester: &User,
        _request: &BloodRequest,
    ) -> Result<(), MailerError> {
        Ok(())
    }

    async fn donor_match(&self, _donor: &User, _request: &BloodRequest) -> Result<(), MailerError> {
        Ok(())
    }

    async fn requester_notification(
        &self,
        _requester: &User,
        _request: &BloodRequest,
        _donor: &User,
    ) -> Result<(), MailerError> {
        Ok(())
    }
}
