//! Blood-request handlers.
//!
//! ```text
//! POST   /api/v1/requests
//! GET    /api/v1/requests?bloodType=AB%2B&urgency=high&status=open
//! GET    /api/v1/requests/{id}
//! PUT    /api/v1/requests/{id}
//! POST   /api/v1/requests/{id}/cancel
//! DELETE /api/v1/requests/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use pagination::Page;
use serde::{Deserialize, Serialize};

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::state::HttpState;
use super::users::CoordinatesDto;
use super::validation::{
    FieldName, parse_blood_type, parse_id, parse_page_request, parse_request_status,
    parse_urgency, require_non_empty, require_positive_units,
};
use crate::domain::ports::{NewRequest, RequestListFilter, RequestUpdate};
use crate::domain::{BloodRequest, Error, Hospital, Patient, RequestId, Urgency};

/// Patient details in request bodies.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    /// Patient name.
    pub name: String,
    /// Required ABO/Rh blood type, e.g. `AB+`.
    pub blood_type: String,
    /// Age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Gender, free form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl PatientDto {
    fn try_into_domain(self) -> Result<Patient, Error> {
        require_non_empty(&self.name, FieldName::new("patient.name"))?;
        let blood_type = parse_blood_type(&self.blood_type, FieldName::new("patient.bloodType"))?;
        Ok(Patient {
            name: self.name,
            blood_type,
            age: self.age,
            gender: self.gender,
        })
    }
}

impl From<Patient> for PatientDto {
    fn from(patient: Patient) -> Self {
        Self {
            name: patient.name,
            blood_type: patient.blood_type.as_str().to_owned(),
            age: patient.age,
            gender: patient.gender,
        }
    }
}

/// Hospital details in request and donation bodies.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalDto {
    /// Hospital name.
    pub name: String,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Map coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinatesDto>,
}

impl HospitalDto {
    pub(crate) fn try_into_domain(self, field: FieldName) -> Result<Hospital, Error> {
        require_non_empty(&self.name, field)?;
        Ok(Hospital {
            name: self.name,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            coordinates: self.coordinates.map(Into::into),
        })
    }
}

impl From<Hospital> for HospitalDto {
    fn from(hospital: Hospital) -> Self {
        Self {
            name: hospital.name,
            address: hospital.address,
            city: hospital.city,
            state: hospital.state,
            country: hospital.country,
            coordinates: hospital.coordinates.map(Into::into),
        }
    }
}

/// One matched donor in a request response.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchedDonorDto {
    /// Donor identifier.
    pub donor: String,
    /// Match progress, one of `matched`, `contacted`, `confirmed`, `donated`.
    pub status: String,
    /// RFC 3339 timestamp of the first match.
    pub matched_at: String,
}

/// Full request view.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    /// Request identifier.
    pub id: String,
    /// Owning user.
    pub requester: String,
    /// Who the blood is for.
    pub patient: PatientDto,
    /// Where it is needed.
    pub hospital: HospitalDto,
    /// Units required before fulfilment.
    pub units_needed: u32,
    /// Urgency level.
    pub urgency: String,
    /// Lifecycle state.
    pub status: String,
    /// Free-form context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Donors matched so far, oldest first.
    pub matched_donors: Vec<MatchedDonorDto>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 last-modified timestamp.
    pub updated_at: String,
}

impl From<BloodRequest> for RequestResponse {
    fn from(request: BloodRequest) -> Self {
        Self {
            id: request.id.to_string(),
            requester: request.requester.to_string(),
            patient: request.patient.into(),
            hospital: request.hospital.into(),
            units_needed: request.units_needed,
            urgency: request.urgency.as_str().to_owned(),
            status: request.status.as_str().to_owned(),
            description: request.description,
            matched_donors: request
                .matched_donors
                .into_iter()
                .map(|entry| MatchedDonorDto {
                    donor: entry.donor.to_string(),
                    status: entry.status.as_str().to_owned(),
                    matched_at: entry.matched_at.to_rfc3339(),
                })
                .collect(),
            created_at: request.created_at.to_rfc3339(),
            updated_at: request.updated_at.to_rfc3339(),
        }
    }
}

/// One page of requests.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestPageResponse {
    /// Requests on this page, newest first.
    pub items: Vec<RequestResponse>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total requests matching the filter.
    pub total: u64,
}

impl From<Page<BloodRequest>> for RequestPageResponse {
    fn from(page: Page<BloodRequest>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            items: page.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body for `POST /api/v1/requests`.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    /// Who the blood is for.
    pub patient: PatientDto,
    /// Where it is needed.
    pub hospital: HospitalDto,
    /// Units required; defaults to 1.
    #[serde(default)]
    pub units_needed: Option<u32>,
    /// Urgency; defaults to `medium`.
    #[serde(default)]
    pub urgency: Option<String>,
    /// Free-form context for donors.
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for `PUT /api/v1/requests/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestBody {
    /// Replacement hospital details.
    #[serde(default)]
    pub hospital: Option<HospitalDto>,
    /// New units target.
    #[serde(default)]
    pub units_needed: Option<u32>,
    /// New urgency level.
    #[serde(default)]
    pub urgency: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request listing query parameters.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
    /// Only requests for this recipient blood type.
    pub blood_type: Option<String>,
    /// Only requests at this urgency.
    pub urgency: Option<String>,
    /// Only requests in this state.
    pub status: Option<String>,
    /// Case-insensitive hospital city match.
    pub city: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
}

/// Create a blood request.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request created", body = RequestResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["requests"],
    operation_id = "createRequest"
)]
#[post("/requests")]
pub async fn create_request(
    state: web::Data<HttpState>,
    current: CurrentUser,
    payload: web::Json<CreateRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let patient = body.patient.try_into_domain()?;
    let hospital = body.hospital.try_into_domain(FieldName::new("hospital.name"))?;
    let units_needed =
        require_positive_units(body.units_needed.unwrap_or(1), FieldName::new("unitsNeeded"))?;
    let urgency = body
        .urgency
        .as_deref()
        .map(|raw| parse_urgency(raw, FieldName::new("urgency")))
        .transpose()?
        .unwrap_or(Urgency::Medium);

    let request = state
        .requests
        .create(
            &current.0,
            NewRequest {
                patient,
                hospital,
                units_needed,
                urgency,
                description: body.description,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(RequestResponse::from(request)))
}

/// List requests.
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "One page of requests", body = RequestPageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["requests"],
    operation_id = "listRequests"
)]
#[get("/requests")]
pub async fn list_requests(
    state: web::Data<HttpState>,
    _current: CurrentUser,
    query: web::Query<RequestQuery>,
) -> ApiResult<web::Json<RequestPageResponse>> {
    let query = query.into_inner();
    let page = parse_page_request(query.page, query.limit)?;
    let filter = RequestListFilter {
        blood_type: query
            .blood_type
            .as_deref()
            .map(|raw| parse_blood_type(raw, FieldName::new("bloodType")))
            .transpose()?,
        urgency: query
            .urgency
            .as_deref()
            .map(|raw| parse_urgency(raw, FieldName::new("urgency")))
            .transpose()?,
        status: query
            .status
            .as_deref()
            .map(|raw| parse_request_status(raw, FieldName::new("status")))
            .transpose()?,
        city: query.city,
    };
    let requests = state.requests.list(filter, page).await?;
    Ok(web::Json(requests.into()))
}

/// Fetch one request.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request", body = RequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown request", body = Error),
    ),
    tags = ["requests"],
    operation_id = "getRequest"
)]
#[get("/requests/{id}")]
pub async fn get_request(
    state: web::Data<HttpState>,
    _current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestResponse>> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let request = state.requests.get(&id).await?;
    Ok(web::Json(request.into()))
}

/// Update a request; requester only.
#[utoipa::path(
    put,
    path = "/api/v1/requests/{id}",
    request_body = UpdateRequestBody,
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Updated request", body = RequestResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the requester", body = Error),
        (status = 404, description = "Unknown request", body = Error),
        (status = 409, description = "No longer open", body = Error),
    ),
    tags = ["requests"],
    operation_id = "updateRequest"
)]
#[put("/requests/{id}")]
pub async fn update_request(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
    payload: web::Json<UpdateRequestBody>,
) -> ApiResult<web::Json<RequestResponse>> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let body = payload.into_inner();
    let changes = RequestUpdate {
        hospital: body
            .hospital
            .map(|dto| dto.try_into_domain(FieldName::new("hospital.name")))
            .transpose()?,
        units_needed: body
            .units_needed
            .map(|units| require_positive_units(units, FieldName::new("unitsNeeded")))
            .transpose()?,
        urgency: body
            .urgency
            .as_deref()
            .map(|raw| parse_urgency(raw, FieldName::new("urgency")))
            .transpose()?,
        description: body.description,
    };
    let request = state.requests.update(&current.0, &id, changes).await?;
    Ok(web::Json(request.into()))
}

/// Cancel a request; requester only.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/cancel",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Closed request", body = RequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the requester", body = Error),
        (status = 404, description = "Unknown request", body = Error),
        (status = 409, description = "Already fulfilled", body = Error),
    ),
    tags = ["requests"],
    operation_id = "cancelRequest"
)]
#[post("/requests/{id}/cancel")]
pub async fn cancel_request(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestResponse>> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let request = state.requests.cancel(&current.0, &id).await?;
    Ok(web::Json(request.into()))
}

/// Delete a request; requester only.
#[utoipa::path(
    delete,
    path = "/api/v1/requests/{id}",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the requester", body = Error),
        (status = 404, description = "Unknown request", body = Error),
    ),
    tags = ["requests"],
    operation_id = "deleteRequest"
)]
#[delete("/requests/{id}")]
pub async fn delete_request(
    state: web::Data<HttpState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: RequestId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    state.requests.delete(&current.0, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}
