//! Profile and donor-directory handlers.
//!
//! ```text
//! GET  /api/v1/users/profile
//! PUT  /api/v1/users/profile
//! GET  /api/v1/users/donors?bloodType=O-&city=Mumbai&page=1&limit=10
//! GET  /api/v1/users/{id}
//! ```

use actix_web::{get, put, web};
use pagination::Page;
use serde::{Deserialize, Serialize};

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::state::HttpState;
use super::validation::{
    FieldName, parse_blood_type, parse_id, parse_page_request, require_non_empty,
};
use crate::domain::ports::{DonorBrowseFilter, ProfileUpdate};
use crate::domain::{Coordinates, Error, Location, User, UserId};

/// Map coordinates in request and response bodies.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatesDto {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl From<CoordinatesDto> for Coordinates {
    fn from(value: CoordinatesDto) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

impl From<Coordinates> for CoordinatesDto {
    fn from(value: Coordinates) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

/// User location in request and response bodies.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    /// City name.
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

impl From<LocationDto> for Location {
    fn from(value: LocationDto) -> Self {
        Self {
            city: value.city,
            state: value.state,
            country: value.country,
            coordinates: value.coordinates.map(Into::into),
        }
    }
}

impl From<Location> for LocationDto {
    fn from(value: Location) -> Self {
        Self {
            city: value.city,
            state: value.state,
            country: value.country,
            coordinates: value.coordinates.map(Into::into),
        }
    }
}

/// Full profile view returned to the account owner.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Contact number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// ABO/Rh blood type, e.g. `O-`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    /// Where the user is based.
    pub location: LocationDto,
    /// Lifetime donations recorded.
    pub donation_count: u32,
    /// RFC 3339 timestamp of the most recent donation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_donation: Option<String>,
    /// Whether the cooldown window has elapsed.
    pub is_eligible: bool,
    /// Whether the user may verify donations.
    pub is_admin: bool,
    /// RFC 3339 account creation timestamp.
    pub created_at: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            blood_type: user.blood_type.map(|bt| bt.as_str().to_owned()),
            location: user.location.into(),
            donation_count: user.donation_count,
            last_donation: user.last_donation.map(|at| at.to_rfc3339()),
            is_eligible: user.is_eligible,
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Public donor view, used by the directory and candidate listings.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorResponse {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// ABO/Rh blood type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    /// City, when shared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State, when shared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Lifetime donations recorded.
    pub donation_count: u32,
    /// Whether the cooldown window has elapsed.
    pub is_eligible: bool,
}

impl From<User> for DonorResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            blood_type: user.blood_type.map(|bt| bt.as_str().to_owned()),
            city: user.location.city,
            state: user.location.state,
            donation_count: user.donation_count,
            is_eligible: user.is_eligible,
        }
    }
}

/// One page of the donor directory.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorPageResponse {
    /// Donors on this page.
    pub items: Vec<DonorResponse>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total donors matching the filter.
    pub total: u64,
}

impl From<Page<User>> for DonorPageResponse {
    fn from(page: Page<User>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            items: page.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Partial profile update body; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New ABO/Rh blood type, e.g. `O-`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    /// Replacement location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDto>,
}

/// Donor directory query parameters.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DonorQuery {
    /// Only donors with exactly this blood type.
    pub blood_type: Option<String>,
    /// Case-insensitive city match.
    pub city: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/users/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    current: CurrentUser,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user = state.users.get_profile(&current.0.id).await?;
    Ok(web::Json(user.into()))
}

/// Apply a partial update to the caller's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    request_body = UpdateProfileBody,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    current: CurrentUser,
    payload: web::Json<UpdateProfileBody>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let body = payload.into_inner();
    if let Some(name) = body.name.as_deref() {
        require_non_empty(name, FieldName::new("name"))?;
    }
    let blood_type = body
        .blood_type
        .as_deref()
        .map(|raw| parse_blood_type(raw, FieldName::new("bloodType")))
        .transpose()?;
    let changes = ProfileUpdate {
        name: body.name,
        phone: body.phone,
        blood_type,
        location: body.location.map(Into::into),
    };
    let user = state.users.update_profile(&current.0.id, changes).await?;
    Ok(web::Json(user.into()))
}

/// Browse registered donors.
#[utoipa::path(
    get,
    path = "/api/v1/users/donors",
    params(DonorQuery),
    responses(
        (status = 200, description = "One page of donors", body = DonorPageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["users"],
    operation_id = "listDonors"
)]
#[get("/users/donors")]
pub async fn list_donors(
    state: web::Data<HttpState>,
    _current: CurrentUser,
    query: web::Query<DonorQuery>,
) -> ApiResult<web::Json<DonorPageResponse>> {
    let query = query.into_inner();
    let page = parse_page_request(query.page, query.limit)?;
    let blood_type = query
        .blood_type
        .as_deref()
        .map(|raw| parse_blood_type(raw, FieldName::new("bloodType")))
        .transpose()?;
    let filter = DonorBrowseFilter {
        blood_type,
        city: query.city,
    };
    let donors = state.users.browse_donors(filter, page).await?;
    Ok(web::Json(donors.into()))
}

/// Public view of a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = DonorResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown user", body = Error),
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    _current: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonorResponse>> {
    let id: UserId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let user = state.users.get_user(&id).await?;
    Ok(web::Json(user.into()))
}
