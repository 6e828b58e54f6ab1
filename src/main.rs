// src/main.rs

use dotenvy::dotenv;
use exam_admin::config::Config;
use exam_admin::routes;
use exam_admin::state::AppState;
use exam_admin::utils::hash::hash_password;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if config.debug {
        tracing::warn!("APP_DEBUG is set; 500 responses will carry error detail");
    }

    // Primary pool carries accounts; the data pool carries the exam domain.
    let pool = connect_pool(&config.database_url, "primary").await;
    let data_pool = if config.data_database_url == config.database_url {
        pool.clone()
    } else {
        connect_pool(&config.data_database_url, "data").await
    };

    tracing::info!("Databases connected...");

    // Run Migrations Automatically. Both sets tolerate sharing one
    // database, which is why ignore_missing is switched on.
    tracing::info!("Running migrations...");
    let mut primary_migrator = sqlx::migrate!("./migrations");
    primary_migrator.set_ignore_missing(true);
    primary_migrator
        .run(&pool)
        .await
        .expect("Failed to run primary database migrations");

    let mut data_migrator = sqlx::migrate!("./data_migrations");
    data_migrator.set_ignore_missing(true);
    data_migrator
        .run(&data_pool)
        .await
        .expect("Failed to run exam-domain migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    // Create AppState
    let state = AppState {
        pool,
        data_pool,
        config,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server. Connect info feeds the rate-limit key extractor.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

async fn connect_pool(url: &str, label: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!(
                        "Failed to connect to {} database after 5 retries: {}",
                        label, e
                    );
                }
                tracing::warn!(
                    "{} database not ready, retrying in 2s... (Attempt {})",
                    label,
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

async fn seed_admin_user(pool: &PgPool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let user_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if user_exists.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let hashed_password = hash_password(password)?;

            sqlx::query("INSERT INTO users (username, password, role) VALUES ($1, $2, 'admin')")
                .bind(username)
                .bind(&hashed_password)
                .execute(pool)
                .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
