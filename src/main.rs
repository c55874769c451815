use actix_web::{web, App, HttpServer};
use anyhow::Context;
use franchise_fees::config::{run_migrations, Config};
use franchise_fees::middleware::{json_error_handler, AdminApiKey, ErrorHandler, RequestId};
use franchise_fees::{modules, AppState};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "franchise_fees=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!(env = config.app.env.as_str(), "Starting franchise fee service");

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!(
        pool_size = config.database.pool_size,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    let state = web::Data::new(AppState::mysql(&db_pool, &config));
    let pool = web::Data::new(db_pool);
    let key_hash = config.security.admin_api_key_hash.clone();

    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(pool.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(AdminApiKey::new(key_hash.clone()))
            .wrap(ErrorHandler)
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .configure(modules::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run();

    tracing::info!(
        address = bind_address.as_str(),
        workers = config.server.workers,
        "Server started"
    );

    server.await?;
    Ok(())
}
