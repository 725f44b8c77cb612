//! Reqwest-backed identity provider adapter.
//!
//! Verifies bearer tokens against a Supabase-style auth endpoint: the token
//! is forwarded as-is and the provider's user record is mapped to domain
//! identity claims. This adapter owns transport details only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::domain::ports::{ExternalIdentity, IdentityError, IdentityProvider};

const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// User record as returned by the auth endpoint.
#[derive(Debug, Deserialize)]
struct AuthUserDto {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: AuthUserMetadataDto,
}

#[derive(Debug, Default, Deserialize)]
struct AuthUserMetadataDto {
    name: Option<String>,
    full_name: Option<String>,
}

impl AuthUserDto {
    fn into_identity(self) -> Result<ExternalIdentity, IdentityError> {
        let email = self.email.filter(|e| !e.is_empty()).ok_or_else(|| {
            IdentityError::unavailable("identity record is missing a verified email")
        })?;
        let name = self.user_metadata.name.or(self.user_metadata.full_name);
        Ok(ExternalIdentity {
            subject: self.id,
            email,
            name,
        })
    }
}

/// [`IdentityProvider`] calling the auth service over HTTP.
pub struct HttpIdentityProvider {
    client: Client,
    verify_url: Url,
    api_key: String,
}

impl HttpIdentityProvider {
    /// Build an adapter against `base_url`, with a 10s request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot be extended or the reqwest
    /// client cannot be constructed.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Result<Self, IdentityError> {
        let verify_url = base_url
            .join("auth/v1/user")
            .map_err(|err| IdentityError::unavailable(err.to_string()))?;
        let client = Client::builder()
            .timeout(DEFAULT_VERIFY_TIMEOUT)
            .build()
            .map_err(|err| IdentityError::unavailable(err.to_string()))?;
        Ok(Self {
            client,
            verify_url,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_bearer(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        let response = self
            .client
            .get(self.verify_url.clone())
            .bearer_auth(token)
            .header("apikey", self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| IdentityError::unavailable(err.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::invalid_token()),
            status if status.is_success() => {
                let dto: AuthUserDto = response
                    .json()
                    .await
                    .map_err(|err| IdentityError::unavailable(err.to_string()))?;
                dto.into_identity()
            }
            status => Err(IdentityError::unavailable(format!(
                "status {}",
                status.as_u16()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn identity_prefers_the_plain_name_field() {
        let dto = AuthUserDto {
            id: "auth0|abc".into(),
            email: Some("donor@example.com".into()),
            user_metadata: AuthUserMetadataDto {
                name: Some("Dana".into()),
                full_name: Some("Dana Donor".into()),
            },
        };
        let identity = dto.into_identity().expect("valid record");
        assert_eq!(identity.subject, "auth0|abc");
        assert_eq!(identity.name.as_deref(), Some("Dana"));
    }

    #[rstest]
    fn missing_email_is_rejected() {
        let dto = AuthUserDto {
            id: "auth0|abc".into(),
            email: None,
            user_metadata: AuthUserMetadataDto::default(),
        };
        assert!(matches!(
            dto.into_identity(),
            Err(IdentityError::Unavailable { .. })
        ));
    }

    #[rstest]
    fn empty_email_is_rejected() {
        let dto = AuthUserDto {
            id: "auth0|abc".into(),
            email: Some(String::new()),
            user_metadata: AuthUserMetadataDto::default(),
        };
        assert!(dto.into_identity().is_err());
    }
}
