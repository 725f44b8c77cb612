//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the generated specification covering every REST
//! endpoint, the shared error envelope, and the bearer token security
//! scheme. Swagger UI serves the document in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, MatchStatus, RequestStatus, Urgency};
use crate::inbound::http::donations::{CreateDonationBody, DonationResponse};
use crate::inbound::http::requests::{
    CreateRequestBody, HospitalDto, MatchedDonorDto, PatientDto, RequestPageResponse,
    RequestResponse, UpdateRequestBody,
};
use crate::inbound::http::users::{
    CoordinatesDto, DonorPageResponse, DonorResponse, LocationDto, ProfileResponse,
    UpdateProfileBody,
};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Token issued by the external identity provider."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "BloodConnect backend API",
        description = "HTTP interface for donor matching, blood requests, and donation tracking."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::list_donors,
        crate::inbound::http::users::get_user,
        crate::inbound::http::requests::create_request,
        crate::inbound::http::requests::list_requests,
        crate::inbound::http::requests::get_request,
        crate::inbound::http::requests::update_request,
        crate::inbound::http::requests::cancel_request,
        crate::inbound::http::requests::delete_request,
        crate::inbound::http::matching::list_candidates,
        crate::inbound::http::matching::match_donors,
        crate::inbound::http::matching::volunteer,
        crate::inbound::http::donations::record_donation,
        crate::inbound::http::donations::my_donations,
        crate::inbound::http::donations::get_donation,
        crate::inbound::http::donations::verify_donation,
        crate::inbound::http::health::live,
        crate::inbound::http::health::ready,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Urgency,
        RequestStatus,
        MatchStatus,
        CoordinatesDto,
        LocationDto,
        ProfileResponse,
        DonorResponse,
        DonorPageResponse,
        UpdateProfileBody,
        PatientDto,
        HospitalDto,
        MatchedDonorDto,
        RequestResponse,
        RequestPageResponse,
        CreateRequestBody,
        UpdateRequestBody,
        DonationResponse,
        CreateDonationBody,
    )),
    tags(
        (name = "users", description = "Profiles and the donor directory"),
        (name = "requests", description = "Blood request lifecycle"),
        (name = "matching", description = "Donor matching and volunteering"),
        (name = "donations", description = "Donation recording and verification"),
        (name = "health", description = "Health probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_the_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn every_request_operation_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/users/profile",
            "/api/v1/users/donors",
            "/api/v1/requests",
            "/api/v1/requests/{id}",
            "/api/v1/requests/{id}/cancel",
            "/api/v1/donors/match/{request_id}",
            "/api/v1/match/{request_id}",
            "/api/v1/match/volunteer/{request_id}",
            "/api/v1/donations",
            "/api/v1/donations/me",
            "/api/v1/donations/verify/{id}",
            "/health/ready",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing documented path {path}"
            );
        }
    }
}
