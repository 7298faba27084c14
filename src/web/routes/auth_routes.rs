use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::sync::Arc;

use crate::services::{auth_service, email_service};
use crate::web::models::{LoginRequest, RegisterRequest, RequestEmailRequest, UserResponse};
use crate::web::{AppState, error::AppError};

pub fn create_auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/refresh_token", get(refresh_token_handler))
        .route("/confirmed_email/{token}", get(confirmed_email_handler))
        .route("/request_email", post(request_email_handler))
}

async fn signup_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = auth_service::register_user(&app_state.db, payload).await?;

    let token = auth_service::create_email_token(&user.email, &app_state.config.jwt_secret)?;
    email_service::spawn_confirmation(
        app_state.mailer.clone(),
        user.email.clone(),
        user.username.clone(),
        token,
    );

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tokens =
        auth_service::login_user(&app_state.db, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build(("token", tokens.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    let mut response = Json(tokens).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        auth_cookie
            .to_string()
            .parse()
            .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))?,
    );
    Ok(response)
}

/// Rotates the token pair. The refresh token is presented as a bearer header,
/// same as the original access token would be.
async fn refresh_token_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let refresh_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidCredentials)?;

    let tokens =
        auth_service::refresh_tokens(&app_state.db, refresh_token, &app_state.config.jwt_secret)
            .await?;
    Ok(Json(tokens))
}

async fn confirmed_email_handler(
    State(app_state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let message =
        auth_service::confirm_email(&app_state.db, &token, &app_state.config.jwt_secret).await?;
    Ok(Json(serde_json::json!({ "message": message })))
}

/// Re-sends the confirmation mail. Responds the same whether or not the
/// address exists, so it cannot be used to probe accounts.
async fn request_email_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RequestEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    use crate::db::services::user_service;

    if let Some(user) = user_service::get_user_by_email(&app_state.db, &payload.email).await? {
        if user.confirmed {
            return Ok(Json(
                serde_json::json!({ "message": "Your email is already confirmed" }),
            ));
        }
        let token = auth_service::create_email_token(&user.email, &app_state.config.jwt_secret)?;
        email_service::spawn_confirmation(
            app_state.mailer.clone(),
            user.email.clone(),
            user.username.clone(),
            token,
        );
    }

    Ok(Json(
        serde_json::json!({ "message": "Check your email for a confirmation link" }),
    ))
}
