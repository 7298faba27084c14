use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

use crate::db::services::user_service;
use crate::services::auth_service::{self, SCOPE_ACCESS};
use crate::web::models::CurrentUser;
use crate::web::{AppState, error::AppError};

/// Bearer-token (or cookie) authentication. Decodes an access-scope JWT,
/// loads the user row and injects it as a [`CurrentUser`] extension.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let jwt_secret = &state.config.jwt_secret;

    // Authorization header first, cookie as fallback.
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = auth_service::decode_token(&token, jwt_secret, SCOPE_ACCESS).map_err(|e| {
        warn!(error = %e, "JWT validation failed in auth middleware");
        AppError::InvalidCredentials
    })?;

    let user = user_service::get_user_by_email(&state.db, &claims.sub)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    req.extensions_mut().insert(CurrentUser::from(user));
    Ok(next.run(req).await)
}
