//! Backend entry-point: runs migrations, builds the pool, and serves the API.

use actix_web::web;
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bloodconnect::inbound::http::HealthState;
use bloodconnect::outbound::persistence::DbPool;
use bloodconnect::server::{AppSettings, create_server};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Bring the schema up to date before the pool starts handing out
/// connections. Runs on a dedicated synchronous connection; migration DDL is
/// not worth an async harness.
fn run_migrations(database_url: &str) -> std::io::Result<()> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| std::io::Error::other(format!("database connection failed: {err}")))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| std::io::Error::other(format!("migrations failed: {err}")))?;
    for migration in applied {
        info!(migration = %migration, "applied migration");
    }
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|err| std::io::Error::other(format!("configuration failed: {err}")))?;

    run_migrations(settings.database_url())?;

    let pool = DbPool::new(settings.pool_config())
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, &settings, pool)?;
    info!(bind_addr = settings.bind_addr(), "serving API");
    server.await
}
