//! Donor-matching handlers.
//!
//! ```text
//! GET  /api/v1/donors/match/{requestId}?nearHospital=true
//! POST /api/v1/match/{requestId}
//! POST /api/v1/match/volunteer/{requestId}
//! ```

use actix_web::{get, post, web};
use serde::Deserialize;

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::requests::RequestResponse;
use super::state::HttpState;
use super::users::DonorResponse;
use super::validation::{FieldName, parse_id};
use crate::domain::matching::LocationFilter;
use crate::domain::{Error, RequestId};

/// Candidate listing query parameters.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuery {
    /// Restrict candidates to the hospital's city or state.
    pub near_hospital: Option<bool>,
}

/// List candidate donors for a request without matching them.
#[utoipa::path(
    get,
    path = "/api/v1/donors/match/{request_id}",
    params(
        ("request_id" = String, Path, description = "Request identifier"),
        MatchQuery,
    ),
    responses(
        (status = 200, description = "Candidate donors, fewest donations first", body = [DonorResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown request", body = Error),
    ),
    tags = ["matching"],
    operation_id = "listCandidates"
)]
#[get("/donors/match/{request_id}")]
pub async fn list_candidates(
    state: web::Data<HttpState>,
    _current: CurrentUser,
    path: web::Path<String>,
    query: web::Query<MatchQuery>,
) -> ApiResult<web::Json<Vec<DonorResponse>>> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("requestId"))?;
    let filter = LocationFilter {
        near_hospital: query.near_hospital.unwrap_or(false),
    };
    let candidates = state.matching.candidates(&id, filter).await?;
    Ok(web::Json(candidates.into_iter().map(Into::into).collect()))
}

/// Match all current candidates to a request; requester only.
#[utoipa::path(
    post,
    path = "/api/v1/match/{request_id}",
    params(("request_id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request with its matched donors", body = RequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the requester", body = Error),
        (status = 404, description = "Unknown request", body = Error),
        (status = 409, description = "No longer open", body = Error),
    ),
    tags = ["matching"],
    operation_id = "matchDonors"
)]
#[post("/match/{request_id}")]
pub async fn match_donors(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestResponse>> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("requestId"))?;
    let request = state.matching.match_donors(&current.0, &id).await?;
    Ok(web::Json(request.into()))
}

/// Volunteer the caller as a donor for a request.
#[utoipa::path(
    post,
    path = "/api/v1/match/volunteer/{request_id}",
    params(("request_id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request including the volunteer", body = RequestResponse),
        (status = 400, description = "Caller is not an eligible match", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown request", body = Error),
        (status = 409, description = "No longer open", body = Error),
    ),
    tags = ["matching"],
    operation_id = "volunteer"
)]
#[post("/match/volunteer/{request_id}")]
pub async fn volunteer(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestResponse>> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("requestId"))?;
    let request = state.matching.volunteer(&current.0, &id).await?;
    Ok(web::Json(request.into()))
}
