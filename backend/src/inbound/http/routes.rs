//! Route table for the HTTP adapter.
//!
//! Literal segments (`/users/profile`, `/donations/me`) are registered
//! before their `{id}` siblings so they are not swallowed by the matcher.

use actix_web::web;

use super::{donations, health, matching, requests, users};

/// Register the versioned API scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(users::get_profile)
            .service(users::update_profile)
            .service(users::list_donors)
            .service(users::get_user)
            .service(requests::create_request)
            .service(requests::list_requests)
            .service(requests::get_request)
            .service(requests::update_request)
            .service(requests::cancel_request)
            .service(requests::delete_request)
            .service(matching::list_candidates)
            .service(matching::match_donors)
            .service(matching::volunteer)
            .service(donations::record_donation)
            .service(donations::my_donations)
            .service(donations::verify_donation)
            .service(donations::get_donation),
    );
}

/// Register the unversioned health probes.
pub fn configure_health(cfg: &mut web::ServiceConfig) {
    cfg.service(health::live).service(health::ready);
}
