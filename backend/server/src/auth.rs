//! # Authentication
//!
//! - Passwords are bcrypt hashed on the blocking pool, never stored in plain text
//! - Tokens are HS256 JWTs carrying the user id and role, no refresh or revocation
//! - Logout only exists on the client, it forgets the token
//!
//! [`CurrentUser`] is the `protect` step: a handler that takes it rejects
//! requests without a valid bearer token. [`authorize`] narrows a route to roles.
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use models::{
    Role, User,
    payloads::{UserDraft, normalize_username},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::{Database, UserRecord},
    error::AppError,
    state::AppState,
    utils::on_duplicate,
};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, lifetime_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::days(lifetime_days),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(decode::<Claims>(token, &self.decoding, &Validation::default())?.claims)
    }
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    Ok(spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    Ok(spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}

/// Stores a new account with the password hashed. A taken username is a 400.
pub async fn create_account(state: &AppState, draft: UserDraft) -> Result<User, AppError> {
    let now = Utc::now();
    let password_hash = hash_password(draft.password, state.config.bcrypt_cost).await?;

    let record = UserRecord {
        user: User {
            id: Uuid::new_v4().to_string(),
            username: draft.username,
            name: draft.name,
            role: draft.role,
            vendor_id: draft.vendor_id,
            created_at: now,
            updated_at: now,
        },
        password_hash,
    };

    state
        .database
        .insert(&record)
        .await
        .map_err(on_duplicate(format!(
            "Username \"{}\" already exists. Please choose a different username.",
            record.user.username
        )))?;

    info!(username = %record.user.username, role = %record.user.role, "User created");

    Ok(record.user)
}

/// Returns a fresh token and the public user for matching credentials.
pub async fn login(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<(String, User), AppError> {
    let username = normalize_username(username);
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Please provide username and password".to_string(),
        ));
    }

    let Some(record) = state.database.find_by_key::<UserRecord>(&username).await? else {
        warn!(%username, "Login failed, unknown username");
        return Err(AppError::Unauthorized("Invalid credentials"));
    };

    if !verify_password(password.to_string(), record.password_hash.clone()).await? {
        warn!(%username, "Login failed, password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(&record.user)?;
    info!(%username, role = %record.user.role, "User logged in");

    Ok((token, record.user))
}

pub async fn resolve_token(
    tokens: &TokenKeys,
    database: &Database,
    token: &str,
) -> Result<User, AppError> {
    let claims = tokens
        .verify(token)
        .map_err(|_| AppError::Unauthorized("Not authorized, token failed"))?;

    database
        .get::<UserRecord>(&claims.sub)
        .await?
        .map(|record| record.user)
        .ok_or(AppError::Unauthorized("Not authorized, token failed"))
}

/// The authenticated caller, loaded fresh from the store on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized("Not authorized, no token"))?;

        let user = resolve_token(&state.tokens, &state.database, token).await?;

        Ok(CurrentUser(user))
    }
}

pub fn authorize(user: &User, roles: &[Role]) -> Result<(), AppError> {
    if roles.contains(&user.role) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "User role {} is not authorized to access this route",
        user.role
    )))
}
