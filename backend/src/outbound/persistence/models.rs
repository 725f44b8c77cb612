//! Row types bridging Diesel and the domain.
//!
//! Enumerated columns are stored as their wire strings. Reads tolerate
//! unknown values with a logged fallback so one corrupt row cannot poison a
//! whole listing.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use super::schema::{blood_requests, donations, matched_donors, users};
use crate::domain::{
    BloodRequest, BloodType, Coordinates, Donation, DonationId, Hospital, Location, MatchStatus,
    MatchedDonor, Patient, RequestId, RequestStatus, Urgency, User, UserId,
};

fn coordinates_from(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        _ => None,
    }
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "counts and units are small positive integers"
)]
fn count_to_db(value: u32) -> i32 {
    value as i32
}

#[expect(clippy::cast_sign_loss, reason = "counts are non-negative in the database")]
fn count_from_db(value: i32) -> u32 {
    value as u32
}

/// One row of `users`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct UserRow {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub blood_type: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub donation_count: i32,
    pub last_donation: Option<DateTime<Utc>>,
    pub is_eligible: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn from_domain(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            external_id: user.external_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            blood_type: user.blood_type.map(|bt| bt.as_str().to_owned()),
            city: user.location.city.clone(),
            state: user.location.state.clone(),
            country: user.location.country.clone(),
            lat: user.location.coordinates.map(|c| c.lat),
            lng: user.location.coordinates.map(|c| c.lng),
            donation_count: count_to_db(user.donation_count),
            last_donation: user.last_donation,
            is_eligible: user.is_eligible,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn into_domain(self) -> User {
        let blood_type = self.blood_type.as_deref().and_then(|raw| {
            raw.parse::<BloodType>()
                .map_err(|_| {
                    warn!(value = raw, user_id = %self.id, "unrecognised blood_type in users row");
                })
                .ok()
        });
        User {
            id: UserId::from_uuid(self.id),
            external_id: self.external_id,
            email: self.email,
            name: self.name,
            phone: self.phone,
            blood_type,
            location: Location {
                city: self.city,
                state: self.state,
                country: self.country,
                coordinates: coordinates_from(self.lat, self.lng),
            },
            donation_count: count_from_db(self.donation_count),
            last_donation: self.last_donation,
            is_eligible: self.is_eligible,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// One row of `blood_requests`, excluding the matched-donor list.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = blood_requests)]
#[diesel(treat_none_as_null = true)]
pub struct RequestRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub patient_blood_type: String,
    pub patient_age: Option<i32>,
    pub patient_gender: Option<String>,
    pub hospital_name: String,
    pub hospital_address: Option<String>,
    pub hospital_city: Option<String>,
    pub hospital_state: Option<String>,
    pub hospital_country: Option<String>,
    pub hospital_lat: Option<f64>,
    pub hospital_lng: Option<f64>,
    pub units_needed: i32,
    pub urgency: String,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestRow {
    pub fn from_domain(request: &BloodRequest) -> Self {
        Self {
            id: *request.id.as_uuid(),
            requester_id: *request.requester.as_uuid(),
            patient_name: request.patient.name.clone(),
            patient_blood_type: request.patient.blood_type.as_str().to_owned(),
            patient_age: request.patient.age.map(count_to_db),
            patient_gender: request.patient.gender.clone(),
            hospital_name: request.hospital.name.clone(),
            hospital_address: request.hospital.address.clone(),
            hospital_city: request.hospital.city.clone(),
            hospital_state: request.hospital.state.clone(),
            hospital_country: request.hospital.country.clone(),
            hospital_lat: request.hospital.coordinates.map(|c| c.lat),
            hospital_lng: request.hospital.coordinates.map(|c| c.lng),
            units_needed: count_to_db(request.units_needed),
            urgency: request.urgency.as_str().to_owned(),
            status: request.status.as_str().to_owned(),
            description: request.description.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }

    pub fn into_domain(self, matched_donors: Vec<MatchedDonor>) -> BloodRequest {
        let blood_type = self.patient_blood_type.parse::<BloodType>().unwrap_or_else(|_| {
            warn!(
                value = self.patient_blood_type,
                request_id = %self.id,
                "unrecognised patient blood_type, defaulting to O+"
            );
            BloodType::OPositive
        });
        let urgency = self.urgency.parse::<Urgency>().unwrap_or_else(|()| {
            warn!(value = self.urgency, request_id = %self.id, "unrecognised urgency");
            Urgency::Medium
        });
        let status = self.status.parse::<RequestStatus>().unwrap_or_else(|()| {
            warn!(value = self.status, request_id = %self.id, "unrecognised status");
            RequestStatus::Open
        });
        BloodRequest {
            id: RequestId::from_uuid(self.id),
            requester: UserId::from_uuid(self.requester_id),
            patient: Patient {
                name: self.patient_name,
                blood_type,
                age: self.patient_age.map(count_from_db),
                gender: self.patient_gender,
            },
            hospital: Hospital {
                name: self.hospital_name,
                address: self.hospital_address,
                city: self.hospital_city,
                state: self.hospital_state,
                country: self.hospital_country,
                coordinates: coordinates_from(self.hospital_lat, self.hospital_lng),
            },
            units_needed: count_from_db(self.units_needed),
            urgency,
            status,
            description: self.description,
            matched_donors,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// One row of `matched_donors`, keyed by `(request_id, donor_id)`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = matched_donors)]
pub struct MatchedDonorRow {
    pub request_id: Uuid,
    pub donor_id: Uuid,
    pub status: String,
    pub matched_at: DateTime<Utc>,
}

impl MatchedDonorRow {
    pub fn from_domain(request: &RequestId, entry: &MatchedDonor) -> Self {
        Self {
            request_id: *request.as_uuid(),
            donor_id: *entry.donor.as_uuid(),
            status: entry.status.as_str().to_owned(),
            matched_at: entry.matched_at,
        }
    }

    pub fn into_domain(self) -> MatchedDonor {
        let status = self.status.parse::<MatchStatus>().unwrap_or_else(|()| {
            warn!(
                value = self.status,
                request_id = %self.request_id,
                donor_id = %self.donor_id,
                "unrecognised match status"
            );
            MatchStatus::Matched
        });
        MatchedDonor {
            donor: UserId::from_uuid(self.donor_id),
            status,
            matched_at: self.matched_at,
        }
    }
}

/// One row of `donations`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = donations)]
pub struct DonationRow {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub request_id: Option<Uuid>,
    pub hospital_name: String,
    pub hospital_address: Option<String>,
    pub hospital_city: Option<String>,
    pub hospital_state: Option<String>,
    pub hospital_country: Option<String>,
    pub hospital_lat: Option<f64>,
    pub hospital_lng: Option<f64>,
    pub donation_date: DateTime<Utc>,
    pub units: i32,
    pub verified: bool,
    pub verification_document: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DonationRow {
    pub fn from_domain(donation: &Donation) -> Self {
        Self {
            id: *donation.id.as_uuid(),
            donor_id: *donation.donor.as_uuid(),
            request_id: donation.request.map(|id| *id.as_uuid()),
            hospital_name: donation.hospital.name.clone(),
            hospital_address: donation.hospital.address.clone(),
            hospital_city: donation.hospital.city.clone(),
            hospital_state: donation.hospital.state.clone(),
            hospital_country: donation.hospital.country.clone(),
            hospital_lat: donation.hospital.coordinates.map(|c| c.lat),
            hospital_lng: donation.hospital.coordinates.map(|c| c.lng),
            donation_date: donation.donation_date,
            units: count_to_db(donation.units),
            verified: donation.verified,
            verification_document: donation.verification_document.clone(),
            notes: donation.notes.clone(),
            created_at: donation.created_at,
        }
    }

    pub fn into_domain(self) -> Donation {
        Donation {
            id: DonationId::from_uuid(self.id),
            donor: UserId::from_uuid(self.donor_id),
            request: self.request_id.map(RequestId::from_uuid),
            hospital: Hospital {
                name: self.hospital_name,
                address: self.hospital_address,
                city: self.hospital_city,
                state: self.hospital_state,
                country: self.hospital_country,
                coordinates: coordinates_from(self.hospital_lat, self.hospital_lng),
            },
            donation_date: self.donation_date,
            units: count_from_db(self.units),
            verified: self.verified,
            verification_document: self.verification_document,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}
