//! Port over the external identity provider.
//!
//! The service never issues credentials itself; callers present a bearer
//! token minted elsewhere and the provider tells us who it belongs to.

use async_trait::async_trait;

use super::macros::define_port_error;

define_port_error! {
    /// Failures surfaced by [`IdentityProvider`] implementations.
    pub enum IdentityError {
        /// The token was rejected by the provider.
        InvalidToken => "bearer token rejected",
        /// The provider could not be reached or answered abnormally.
        Unavailable { message: String } => "identity provider unavailable: {message}",
    }
}

/// Identity claims returned for a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable subject identifier issued by the provider.
    pub subject: String,
    /// Verified email address.
    pub email: String,
    /// Display name, when the provider has one on file.
    pub name: Option<String>,
}

/// Driven port verifying bearer tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the identity it represents.
    async fn verify_bearer(&self, token: &str) -> Result<ExternalIdentity, IdentityError>;
}
