//! Server construction and middleware wiring.

mod config;

pub use config::AppSettings;

use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use async_trait::async_trait;
use reqwest::Url;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{
    ExternalIdentity, IdentityError, IdentityProvider,
};
use crate::domain::{DonationService, MatchService, RequestService, UserService};
use crate::inbound::http::{HealthState, HttpState};
use crate::inbound::http::{configure_api, configure_health};
use crate::middleware::{RateLimit, Trace};
use crate::outbound::identity::HttpIdentityProvider;
use crate::outbound::mailer::HttpMailer;
use crate::outbound::persistence::{
    DbPool, DieselDonationRepository, DieselRequestRepository, DieselUserRepository,
};

/// Stand-in used when no identity provider is configured; every token is
/// answered with 503 rather than silently accepted.
struct UnconfiguredIdentityProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    async fn verify_bearer(&self, _token: &str) -> Result<ExternalIdentity, IdentityError> {
        Err(IdentityError::unavailable(
            "identity provider not configured",
        ))
    }
}

fn parse_endpoint(raw: &str, what: &str) -> std::io::Result<Url> {
    Url::parse(raw).map_err(|err| std::io::Error::other(format!("invalid {what}: {err}")))
}

/// Assemble repositories, services, and the handler-facing state bundle.
///
/// # Errors
///
/// Returns [`std::io::Error`] when a configured endpoint URL is invalid or an
/// HTTP client cannot be constructed.
pub fn build_http_state(settings: &AppSettings, pool: DbPool) -> std::io::Result<HttpState> {
    let user_repo = Arc::new(DieselUserRepository::new(pool.clone()));
    let request_repo = Arc::new(DieselRequestRepository::new(pool.clone()));
    let donation_repo = Arc::new(DieselDonationRepository::new(pool));

    let mail_endpoint = settings
        .mail_endpoint
        .as_deref()
        .map(|raw| parse_endpoint(raw, "mail endpoint"))
        .transpose()?;
    let mailer = Arc::new(
        HttpMailer::new(mail_endpoint).map_err(|err| std::io::Error::other(err.to_string()))?,
    );

    let users = match settings.identity_url.as_deref() {
        Some(raw) => {
            let identity_url = parse_endpoint(raw, "identity URL")?;
            let identity = Arc::new(
                HttpIdentityProvider::new(
                    identity_url,
                    settings.identity_api_key.clone().unwrap_or_default(),
                )
                .map_err(|err| std::io::Error::other(err.to_string()))?,
            );
            Arc::new(UserService::new(
                Arc::clone(&user_repo),
                identity,
                Arc::clone(&mailer),
            )) as Arc<dyn crate::domain::ports::UsersService>
        }
        None => Arc::new(UserService::new(
            Arc::clone(&user_repo),
            Arc::new(UnconfiguredIdentityProvider),
            Arc::clone(&mailer),
        )),
    };
    let requests = Arc::new(RequestService::new(
        Arc::clone(&request_repo),
        Arc::clone(&mailer),
    ));
    let matching = Arc::new(MatchService::new(
        Arc::clone(&request_repo),
        Arc::clone(&user_repo),
        Arc::clone(&mailer),
    ));
    let donations = Arc::new(DonationService::new(donation_repo, request_repo, user_repo));

    Ok(HttpState::new(users, requests, matching, donations))
}

/// Construct the Actix HTTP server.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when wiring collaborators or binding the
/// socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    settings: &AppSettings,
    pool: DbPool,
) -> std::io::Result<Server> {
    let http_state = build_http_state(settings, pool)?;
    let rate_limit = RateLimit::new(
        settings.rate_limit_max_requests(),
        settings.rate_limit_window(),
    );
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(server_health_state.clone())
            .app_data(web::Data::new(http_state.clone()))
            .wrap(rate_limit.clone())
            .wrap(Trace)
            .configure(configure_api)
            .configure(configure_health);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(settings.bind_addr())?
    .run();

    health_state.set_ready(true);
    Ok(server)
}
