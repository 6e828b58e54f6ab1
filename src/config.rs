// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Fixed primary key of the single shared exam access-token row.
pub const TOKEN_ROW_ID: i64 = 1;

/// Length of a generated exam access code.
pub const TOKEN_CODE_LENGTH: usize = 6;

/// Alphabet for generated access codes: uppercase letters and digits.
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default page size for paginated listings.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Upper bound on client-supplied page sizes.
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    /// Primary application database (accounts).
    pub database_url: String,

    /// Exam-domain database. Falls back to `database_url` when
    /// DATA_DATABASE_URL is not set, so a single-database deployment
    /// works out of the box.
    pub data_database_url: String,

    pub jwt_secret: String,

    /// Token lifetime in seconds.
    pub jwt_expiration: u64,

    pub rust_log: String,

    /// Optional credentials for seeding the initial admin account.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// When true, 500 responses carry the underlying error detail.
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let data_database_url =
            env::var("DATA_DATABASE_URL").unwrap_or_else(|_| database_url.clone());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let debug = env::var("APP_DEBUG")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false);

        Self {
            database_url,
            data_database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            debug,
        }
    }
}
