//! HTTP adapter: handlers, DTOs, and route wiring.

pub mod auth;
pub mod donations;
pub mod error;
pub mod health;
pub mod matching;
pub mod requests;
pub mod routes;
pub mod state;
pub mod users;
mod validation;

pub use auth::CurrentUser;
pub use error::ApiResult;
pub use health::HealthState;
pub use routes::{configure_api, configure_health};
pub use state::HttpState;
