use society_portal::{
    AppState,
    config::{AppConfig, Env, StorageBackend},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{LocalDiskStore, S3ObjectStore, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: initializes configuration, logging, the
/// database pool, the upload store, and the HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration & environment loading (fail-fast on missing secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Log filter: RUST_LOG wins, with sensible local defaults otherwise.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "society_portal=debug,tower_http=info,axum=trace".into());

    // 3. Log format is selected by environment: pretty for humans locally,
    //    JSON for log aggregation in production.
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

    // 4. Database pool.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Upload store: local disk by default, S3-compatible bucket when
    //    configured. Route logic never sees the difference.
    let storage: StorageState = match &config.storage {
        StorageBackend::Local => {
            tracing::info!("Serving uploads from {:?}", config.uploads_dir);
            Arc::new(LocalDiskStore::new(config.uploads_dir.clone()))
        }
        StorageBackend::S3 {
            endpoint,
            region,
            access_key,
            secret_key,
            bucket,
        } => {
            let client = S3ObjectStore::new(endpoint, region, access_key, secret_key, bucket).await;
            // Development convenience for MinIO-style local stacks.
            if config.env == Env::Local {
                client.ensure_bucket_exists().await;
            }
            Arc::new(client)
        }
    };

    // 6. Unified state assembly.
    let app_state = AppState {
        repo,
        storage,
        config,
    };

    // 7. Router and server startup.
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
