//! Ports connecting the domain to the outside world.
//!
//! Driven ports (repositories, identity, mail) are implemented by outbound
//! adapters; driving ports (the `*Service` traits) are implemented by the
//! domain services and consumed by the HTTP layer.

mod macros;

mod donation_repository;
mod identity_provider;
mod mailer;
mod request_repository;
mod services;
mod user_repository;

pub use donation_repository::{DonationPersistenceError, DonationRepository};
pub use identity_provider::{ExternalIdentity, IdentityError, IdentityProvider};
pub use mailer::{Mailer, MailerError, NoopMailer};
pub use request_repository::{RequestListFilter, RequestPersistenceError, RequestRepository};
pub use services::{
    DonationsService, MatchingService, NewDonation, NewRequest, ProfileUpdate, RequestUpdate,
    RequestsService, UsersService,
};
pub use user_repository::{
    CandidateQuery, DonorBrowseFilter, UserPersistenceError, UserRepository,
};

#[cfg(test)]
pub use donation_repository::MockDonationRepository;
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
#[cfg(test)]
pub use mailer::MockMailer;
#[cfg(test)]
pub use request_repository::MockRequestRepository;
#[cfg(test)]
pub use services::{
    MockDonationsService, MockMatchingService, MockRequestsService, MockUsersService,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
