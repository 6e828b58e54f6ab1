// src/utils/jwt.rs

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Claims carried by an access token.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Account ID, stringified per JWT convention.
    pub sub: String,
    /// Account role: 'operator' or 'admin'.
    pub role: String,
    /// Expiry as a Unix timestamp.
    pub exp: usize,
}

/// Signs a token for an authenticated account.
pub fn sign_jwt(
    id: i64,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: id.to_string(),
        role: role.to_owned(),
        exp: Utc::now().timestamp() as usize + expiration_seconds as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies a token's signature and expiry, returning its claims.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))
}

/// Pulls the bearer token out of the Authorization header, if present.
fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication middleware.
///
/// Validates the bearer token and injects the decoded `Claims` into the
/// request extensions for handlers downstream. Failures answer with the
/// same JSON error shape the handlers use.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or(AppError::AuthError("Missing bearer token".to_string()))?
        .to_owned();

    let claims = verify_jwt(&token, &config.jwt_secret)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authorization middleware: admits only claims carrying the admin role.
/// Must run after `auth_middleware`.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::AuthError("Missing credentials".to_string()))?;

    if claims.role != "admin" {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}
