//! Core domain: entities, matching rules, ports, and application services.
//!
//! Everything here is transport and storage agnostic. The HTTP layer talks
//! to the [`ports`] service traits; adapters implement the repository and
//! gateway ports.

mod blood_type;
mod donation;
mod donation_service;
mod error;
pub mod matching;
pub mod ports;
mod request;
mod request_service;
mod user;
mod users_service;

pub use blood_type::{ALL_BLOOD_TYPES, BloodType, BloodTypeParseError};
pub use donation::{Donation, DonationId};
pub use donation_service::DonationService;
pub use error::{Error, ErrorCode, ErrorValidationError};
pub use request::{
    BloodRequest, Hospital, MatchStatus, MatchedDonor, Patient, RequestId, RequestStatus, Urgency,
};
pub use request_service::{MatchService, RequestService};
pub use user::{
    Coordinates, ELIGIBILITY_COOLDOWN_MONTHS, Location, User, UserId,
};
pub use users_service::UserService;
