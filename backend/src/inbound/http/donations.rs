//! Donation handlers.
//!
//! ```text
//! POST /api/v1/donations
//! GET  /api/v1/donations/me
//! GET  /api/v1/donations/{id}
//! POST /api/v1/donations/verify/{id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::requests::HospitalDto;
use super::state::HttpState;
use super::validation::{
    FieldName, parse_id, parse_rfc3339_timestamp, require_positive_units,
};
use crate::domain::ports::NewDonation;
use crate::domain::{Donation, DonationId, Error, RequestId};

/// Full donation view, visible to the donor and administrators.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationResponse {
    /// Donation identifier.
    pub id: String,
    /// The donating user.
    pub donor: String,
    /// Request this donation answers, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    /// Where the donation took place.
    pub hospital: HospitalDto,
    /// RFC 3339 timestamp of the donation.
    pub donation_date: String,
    /// Units donated.
    pub units: u32,
    /// Whether an administrator confirmed the donation.
    pub verified: bool,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// RFC 3339 record creation timestamp.
    pub created_at: String,
}

impl From<Donation> for DonationResponse {
    fn from(donation: Donation) -> Self {
        Self {
            id: donation.id.to_string(),
            donor: donation.donor.to_string(),
            request: donation.request.map(|id| id.to_string()),
            hospital: donation.hospital.into(),
            donation_date: donation.donation_date.to_rfc3339(),
            units: donation.units,
            verified: donation.verified,
            notes: donation.notes,
            created_at: donation.created_at.to_rfc3339(),
        }
    }
}

/// Body for `POST /api/v1/donations`.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationBody {
    /// Request this donation answers.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Where the donation took place.
    pub hospital: HospitalDto,
    /// Units donated; defaults to 1.
    #[serde(default)]
    pub units: Option<u32>,
    /// RFC 3339 donation timestamp; defaults to now.
    #[serde(default)]
    pub donation_date: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Record a completed donation by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/donations",
    request_body = CreateDonationBody,
    responses(
        (status = 201, description = "Donation recorded", body = DonationResponse),
        (status = 400, description = "Invalid request or donor not eligible", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Referenced request unknown", body = Error),
    ),
    tags = ["donations"],
    operation_id = "recordDonation"
)]
#[post("/donations")]
pub async fn record_donation(
    state: web::Data<HttpState>,
    current: CurrentUser,
    payload: web::Json<CreateDonationBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = body
        .request_id
        .as_deref()
        .map(|raw| parse_id::<RequestId>(raw, FieldName::new("requestId")))
        .transpose()?;
    let hospital = body.hospital.try_into_domain(FieldName::new("hospital.name"))?;
    let units = require_positive_units(body.units.unwrap_or(1), FieldName::new("units"))?;
    let donation_date = body
        .donation_date
        .as_deref()
        .map(|raw| parse_rfc3339_timestamp(raw, FieldName::new("donationDate")))
        .transpose()?;

    let donation = state
        .donations
        .record(
            &current.0,
            NewDonation {
                request,
                hospital,
                units,
                donation_date,
                notes: body.notes,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(DonationResponse::from(donation)))
}

/// List the caller's donations, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/donations/me",
    responses(
        (status = 200, description = "Caller's donations", body = [DonationResponse]),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["donations"],
    operation_id = "myDonations"
)]
#[get("/donations/me")]
pub async fn my_donations(
    state: web::Data<HttpState>,
    current: CurrentUser,
) -> ApiResult<web::Json<Vec<DonationResponse>>> {
    let donations = state.donations.my_donations(&current.0.id).await?;
    Ok(web::Json(donations.into_iter().map(Into::into).collect()))
}

/// Fetch one donation; its donor or an administrator only.
#[utoipa::path(
    get,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation identifier")),
    responses(
        (status = 200, description = "Donation", body = DonationResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the donor", body = Error),
        (status = 404, description = "Unknown donation", body = Error),
    ),
    tags = ["donations"],
    operation_id = "getDonation"
)]
#[get("/donations/{id}")]
pub async fn get_donation(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonationResponse>> {
    let id: DonationId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let donation = state.donations.get(&current.0, &id).await?;
    Ok(web::Json(donation.into()))
}

/// Mark a donation verified; administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/donations/verify/{id}",
    params(("id" = String, Path, description = "Donation identifier")),
    responses(
        (status = 200, description = "Verified donation", body = DonationResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Administrator access required", body = Error),
        (status = 404, description = "Unknown donation", body = Error),
    ),
    tags = ["donations"],
    operation_id = "verifyDonation"
)]
#[post("/donations/verify/{id}")]
pub async fn verify_donation(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonationResponse>> {
    let id: DonationId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let donation = state.donations.verify(&current.0, &id).await?;
    Ok(web::Json(donation.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockDonationsService, MockMatchingService, MockRequestsService, MockUsersService,
    };
    use crate::domain::{Hospital, User, UserId};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn caller() -> User {
        User::new("sub|123", "dana@example.com", "Dana")
    }

    fn state_with(donations: MockDonationsService) -> HttpState {
        let user = caller();
        let mut users = MockUsersService::new();
        users
            .expect_authenticate_bearer()
            .returning(move |_| Ok(user.clone()));
        HttpState::new(
            Arc::new(users),
            Arc::new(MockRequestsService::new()),
            Arc::new(MockMatchingService::new()),
            Arc::new(donations),
        )
    }

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .service(record_donation)
                .service(my_donations)
                .service(verify_donation)
                .service(get_donation),
        )
    }

    fn sample_donation(donor: UserId) -> Donation {
        Donation::new(
            donor,
            None,
            Hospital {
                name: "City Hospital".into(),
                ..Hospital::default()
            },
            1,
        )
    }

    #[actix_web::test]
    async fn recording_returns_201_with_the_unverified_donation() {
        let mut donations = MockDonationsService::new();
        donations.expect_record().returning(|donor, input| {
            Ok(Donation::new(
                donor.id,
                input.request,
                input.hospital,
                input.units,
            ))
        });
        let app = actix_test::init_service(test_app(state_with(donations))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .insert_header((AUTHORIZATION, "Bearer token"))
                .set_json(json!({ "hospital": { "name": "City Hospital" } }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["verified"], false);
        assert_eq!(body["units"], 1);
    }

    #[actix_web::test]
    async fn ineligible_donors_get_a_400() {
        let mut donations = MockDonationsService::new();
        donations
            .expect_record()
            .returning(|_, _| Err(Error::invalid_request("you are not eligible to donate yet")));
        let app = actix_test::init_service(test_app(state_with(donations))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .insert_header((AUTHORIZATION, "Bearer token"))
                .set_json(json!({ "hospital": { "name": "City Hospital" } }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn malformed_donation_dates_are_rejected() {
        let app = actix_test::init_service(test_app(state_with(MockDonationsService::new())))
            .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .insert_header((AUTHORIZATION, "Bearer token"))
                .set_json(json!({
                    "hospital": { "name": "City Hospital" },
                    "donationDate": "01/08/2026"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "donationDate");
    }

    #[actix_web::test]
    async fn donations_me_routes_before_the_id_matcher() {
        let mut donations = MockDonationsService::new();
        donations
            .expect_my_donations()
            .returning(|donor| Ok(vec![sample_donation(*donor)]));
        let app = actix_test::init_service(test_app(state_with(donations))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/donations/me")
                .insert_header((AUTHORIZATION, "Bearer token"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.as_array().expect("array").len(), 1);
    }

    #[actix_web::test]
    async fn verification_by_non_admins_is_forbidden() {
        let mut donations = MockDonationsService::new();
        donations
            .expect_verify()
            .returning(|_, _| Err(Error::forbidden("administrator access required")));
        let app = actix_test::init_service(test_app(state_with(donations))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/donations/verify/{}", DonationId::random()))
                .insert_header((AUTHORIZATION, "Bearer token"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
