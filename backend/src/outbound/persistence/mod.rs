//! PostgreSQL persistence via Diesel.

pub mod diesel_donation_repository;
pub mod diesel_request_repository;
pub mod diesel_user_repository;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_donation_repository::DieselDonationRepository;
pub use diesel_request_repository::DieselRequestRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
