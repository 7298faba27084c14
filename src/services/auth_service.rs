use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;

use crate::db::entities::user;
use crate::db::services::user_service;
use crate::web::error::AppError;
use crate::web::models::{Claims, LoginRequest, RegisterRequest, TokenResponse};

pub const SCOPE_ACCESS: &str = "access";
pub const SCOPE_REFRESH: &str = "refresh";
pub const SCOPE_EMAIL: &str = "email";

const ACCESS_TTL_MINUTES: i64 = 15;
const REFRESH_TTL_DAYS: i64 = 7;
const EMAIL_TTL_DAYS: i64 = 7;

/// Creates the account unconfirmed. The confirmation e-mail is sent by the
/// route layer in the background, not here.
pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
) -> Result<user::Model, AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::InvalidInput("Username must not be empty".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if user_service::get_user_by_email(db, &req.email).await?.is_some() {
        return Err(AppError::AccountExists);
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::PasswordHashing(e.to_string()))?;

    user_service::create_user(db, req.username, req.email, password_hash).await
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    let user = user_service::get_user_by_email(db, &req.email)
        .await?
        .ok_or(AppError::InvalidEmail)?;

    if !user.confirmed {
        return Err(AppError::EmailNotConfirmed);
    }

    let valid = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::InvalidPassword);
    }

    issue_token_pair(db, user, jwt_secret).await
}

/// Validates a refresh-scope token against the copy stored on the user row and
/// rotates the pair. A mismatch invalidates the stored token: either the
/// presented token or the stored one has leaked, and neither stays usable.
pub async fn refresh_tokens(
    db: &DatabaseConnection,
    refresh_token: &str,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    let claims = decode_token(refresh_token, jwt_secret, SCOPE_REFRESH)?;
    let user = user_service::get_user_by_email(db, &claims.sub)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if user.refresh_token.as_deref() != Some(refresh_token) {
        user_service::update_refresh_token(db, user, None).await?;
        return Err(AppError::InvalidCredentials);
    }

    issue_token_pair(db, user, jwt_secret).await
}

pub async fn confirm_email(
    db: &DatabaseConnection,
    token: &str,
    jwt_secret: &str,
) -> Result<&'static str, AppError> {
    let claims = decode_token(token, jwt_secret, SCOPE_EMAIL)?;
    let user = user_service::get_user_by_email(db, &claims.sub)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if user.confirmed {
        return Ok("Your email is already confirmed");
    }
    user_service::confirm_email(db, &claims.sub).await?;
    Ok("Email confirmed")
}

async fn issue_token_pair(
    db: &DatabaseConnection,
    user: user::Model,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    let access_token = create_token(
        &user.email,
        SCOPE_ACCESS,
        Duration::minutes(ACCESS_TTL_MINUTES),
        jwt_secret,
    )?;
    let refresh_token = create_token(
        &user.email,
        SCOPE_REFRESH,
        Duration::days(REFRESH_TTL_DAYS),
        jwt_secret,
    )?;
    user_service::update_refresh_token(db, user, Some(refresh_token.clone())).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
    })
}

pub fn create_email_token(email: &str, jwt_secret: &str) -> Result<String, AppError> {
    create_token(email, SCOPE_EMAIL, Duration::days(EMAIL_TTL_DAYS), jwt_secret)
}

pub fn create_token(
    sub: &str,
    scope: &str,
    ttl: Duration,
    jwt_secret: &str,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        scope: scope.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreation(e.to_string()))
}

/// Decodes and validates a token, additionally requiring the expected scope.
/// An access token never passes where a refresh token is expected and vice
/// versa.
pub fn decode_token(token: &str, jwt_secret: &str, expected_scope: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidCredentials)?;

    if data.claims.scope != expected_scope {
        return Err(AppError::InvalidCredentials);
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_keeps_subject_and_scope() {
        let token = create_token("ali@example.com", SCOPE_ACCESS, Duration::minutes(15), SECRET)
            .unwrap();
        let claims = decode_token(&token, SECRET, SCOPE_ACCESS).unwrap();
        assert_eq!(claims.sub, "ali@example.com");
        assert_eq!(claims.scope, SCOPE_ACCESS);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn scope_mismatch_is_rejected() {
        let token = create_token("ali@example.com", SCOPE_REFRESH, Duration::days(7), SECRET)
            .unwrap();
        let err = decode_token(&token, SECRET, SCOPE_ACCESS).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("ali@example.com", SCOPE_ACCESS, Duration::minutes(15), SECRET)
            .unwrap();
        let err = decode_token(&token, "another-secret", SCOPE_ACCESS).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("ali@example.com", SCOPE_ACCESS, Duration::minutes(-5), SECRET)
            .unwrap();
        assert!(decode_token(&token, SECRET, SCOPE_ACCESS).is_err());
    }
}
