// tests/common/mod.rs

use exam_admin::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub const TEST_JWT_SECRET: &str = "test_secret_for_integration_tests";

/// Spawns the app on a random port against the database from DATABASE_URL.
/// Returns None (and the test should bail out) when no database is
/// configured, so the suite can run in environments without Postgres.
pub async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    // 2. Run both migration sets; they share this database in tests
    let mut primary_migrator = sqlx::migrate!("./migrations");
    primary_migrator.set_ignore_missing(true);
    primary_migrator
        .run(&pool)
        .await
        .expect("Failed to migrate primary tables");

    let mut data_migrator = sqlx::migrate!("./data_migrations");
    data_migrator.set_ignore_missing(true);
    data_migrator
        .run(&pool)
        .await
        .expect("Failed to migrate exam-domain tables");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        data_database_url: database_url.clone(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        debug: false,
    };

    let state = AppState {
        pool: pool.clone(),
        data_pool: pool.clone(),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background. Connect info feeds the
    //    rate-limit key extractor.
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some((address, pool))
}

/// Inserts a fresh admin account and signs a JWT for it.
pub async fn admin_token(pool: &PgPool) -> String {
    let username = format!("admin_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let hashed = exam_admin::utils::hash::hash_password("password123").unwrap();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password, role) VALUES ($1, $2, 'admin') RETURNING id",
    )
    .bind(&username)
    .bind(&hashed)
    .fetch_one(pool)
    .await
    .expect("Failed to seed admin account");

    exam_admin::utils::jwt::sign_jwt(id, "admin", TEST_JWT_SECRET, 600).unwrap()
}
