//! Reqwest-backed notification adapter.
//!
//! Hands rendered message payloads to an HTTP mail gateway. When no gateway
//! endpoint is configured the adapter drops messages with a debug log, which
//! keeps local development quiet without a fake SMTP server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{Mailer, MailerError};
use crate::domain::{BloodRequest, User};

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Mailer`] posting message payloads to an HTTP gateway.
pub struct HttpMailer {
    client: Client,
    endpoint: Option<Url>,
}

impl HttpMailer {
    /// Build a mailer; `endpoint` of `None` drops all messages.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Option<Url>) -> Result<Self, MailerError> {
        let client = Client::builder()
            .timeout(DEFAULT_SEND_TIMEOUT)
            .build()
            .map_err(|err| MailerError::send(err.to_string()))?;
        Ok(Self { client, endpoint })
    }

    async fn deliver(
        &self,
        template: &str,
        to: &User,
        data: serde_json::Value,
    ) -> Result<(), MailerError> {
        let Some(endpoint) = &self.endpoint else {
            debug!(template, to = %to.email, "mail gateway unconfigured, dropping message");
            return Ok(());
        };
        let response = self
            .client
            .post(endpoint.clone())
            .json(&json!({
                "template": template,
                "to": { "email": to.email, "name": to.name },
                "data": data,
            }))
            .send()
            .await
            .map_err(|err| MailerError::send(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MailerError::send(format!("status {}", status.as_u16())));
        }
        Ok(())
    }
}

fn request_summary(request: &BloodRequest) -> serde_json::Value {
    json!({
        "requestId": request.id.to_string(),
        "bloodType": request.patient.blood_type.as_str(),
        "unitsNeeded": request.units_needed,
        "urgency": request.urgency.as_str(),
        "hospital": request.hospital.name,
        "city": request.hospital.city,
    })
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn welcome(&self, user: &User) -> Result<(), MailerError> {
        self.deliver("welcome", user, json!({ "name": user.name }))
            .await
    }

    async fn request_confirmation(
        &self,
        requester: &User,
        request: &BloodRequest,
    ) -> Result<(), MailerError> {
        self.deliver("request-confirmation", requester, request_summary(request))
            .await
    }

    async fn donor_match(&self, donor: &User, request: &BloodRequest) -> Result<(), MailerError> {
        self.deliver("donor-match", donor, request_summary(request))
            .await
    }

    async fn requester_notification(
        &self,
        requester: &User,
        request: &BloodRequest,
        donor: &User,
    ) -> Result<(), MailerError> {
        let mut data = request_summary(request);
        if let Some(object) = data.as_object_mut() {
            object.insert("donorName".into(), json!(donor.name));
        }
        self.deliver("requester-notification", requester, data)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BloodType, Hospital, Patient, Urgency, UserId};
    use rstest::rstest;

    fn fixture_request() -> BloodRequest {
        BloodRequest::new(
            UserId::random(),
            Patient {
                name: "John".into(),
                blood_type: BloodType::AbPositive,
                age: None,
                gender: None,
            },
            Hospital {
                name: "City Hospital".into(),
                city: Some("Pune".into()),
                ..Hospital::default()
            },
            2,
            Urgency::High,
            None,
        )
    }

    #[rstest]
    fn summaries_carry_the_matching_fields() {
        let request = fixture_request();
        let summary = request_summary(&request);
        assert_eq!(summary["bloodType"], "AB+");
        assert_eq!(summary["unitsNeeded"], 2);
        assert_eq!(summary["urgency"], "high");
        assert_eq!(summary["city"], "Pune");
    }

    #[actix_rt::test]
    async fn unconfigured_gateway_drops_messages() {
        let mailer = HttpMailer::new(None).expect("client builds");
        let user = User::new("auth0|abc", "donor@example.com", "Dana");
        mailer.welcome(&user).await.expect("dropped, not failed");
    }
}
