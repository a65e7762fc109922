use feedback_board::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: initializes configuration, logging, the
/// database pool, and the HTTP server.
#[tokio::main]
async fn main() {
    // Configuration & environment loading (fail-fast).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Log filter: RUST_LOG wins, with sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "feedback_board=debug,tower_http=info,axum=trace".into());

    // Structured logging format selected by the runtime environment:
    // pretty output locally, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Database initialization (Postgres as the document store).
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = PostgresRepository::new(pool);

    // LOCAL-ONLY: provision the three tables if missing. Production schemas
    // are managed out of band.
    if config.env == Env::Local {
        repo.ensure_schema()
            .await
            .expect("FATAL: Failed to provision local schema.");
    }

    let repo = Arc::new(repo) as RepositoryState;

    let app_state = AppState {
        repo,
        config: config.clone(),
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("FATAL: Failed to bind listener port.");

    tracing::info!("Listening on 0.0.0.0:{}", config.port);
    tracing::info!(
        "API documentation (Swagger UI) available at: http://localhost:{}/swagger-ui",
        config.port
    );

    axum::serve(listener, app)
        .await
        .expect("FATAL: Server terminated unexpectedly.");
}
