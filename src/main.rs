use std::sync::Arc;

use dotenvy::dotenv;
use product_tracker::{
    config::{database, settings},
    core::{accounts, seeding},
    errors::{Error, Result},
    web::{self, AppState},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings (config.toml is optional, environment overrides applied)
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure every table exists
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed roles, then the administrator if one is configured
    seeding::ensure_roles(&db)
        .await
        .inspect_err(|e| error!("Failed to seed roles: {}", e))?;
    match config.admin.as_ref() {
        Some(admin) => {
            seeding::ensure_admin_account(&db, admin)
                .await
                .inspect_err(|e| error!("Failed to seed administrator: {}", e))?;
        }
        None => warn!("No [admin] section configured; nobody can manage products yet."),
    }

    accounts::purge_expired_sessions(&db).await?;

    // 6. Serve
    let state = AppState {
        database: Arc::new(db),
        session_ttl: chrono::Duration::hours(config.server.session_hours),
    };
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", config.server.bind_address, e))?;
    info!("Listening on http://{}", config.server.bind_address);

    axum::serve(listener, web::router(state))
        .await
        .map_err(Error::from)
}
