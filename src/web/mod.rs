use axum::{
    Json, Router,
    extract::State,
    http::Method,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::server::config::ServerConfig;
use crate::services::cloudinary_service::CloudinaryService;
use crate::services::email_service::Mailer;
use crate::web::middleware::{auth, rate_limit};
use crate::web::routes::*;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;

pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub cloudinary: CloudinaryService,
    pub mailer: Arc<Mailer>,
    pub rate_limiter: rate_limit::RateLimiter,
}

async fn health_check_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .db
        .ping()
        .await
        .map_err(|e| AppError::Database(format!("Error connecting to the database: {e}")))?;
    Ok(Json(serde_json::json!({ "message": "Welcome to PhotoShare!" })))
}

pub fn create_router(
    db: DatabaseConnection,
    config: Arc<ServerConfig>,
) -> Router {
    let cloudinary = CloudinaryService::new(&config);
    let mailer = Arc::new(Mailer::new(&config));

    let app_state = Arc::new(AppState {
        db,
        config,
        cloudinary,
        mailer,
        rate_limiter: rate_limit::RateLimiter::new(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/healthchecker", get(health_check_handler))
        .nest("/api/auth", auth_routes::create_auth_router())
        .nest(
            "/api/users",
            user_routes::create_user_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api/photos",
            photo_routes::create_photos_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api/comments",
            comment_routes::create_public_router().merge(
                comment_routes::create_protected_router().route_layer(
                    axum_middleware::from_fn_with_state(app_state.clone(), auth::auth),
                ),
            ),
        )
        // Rate limit first in source order, auth second: the auth layer is the
        // outer one and has populated CurrentUser by the time the limiter runs.
        .nest(
            "/api/contacts",
            contact_routes::create_contacts_router()
                .route_layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    rate_limit::contacts_rate_limit,
                ))
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api/posts",
            post_routes::create_posts_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .with_state(app_state)
        .layer(cors)
}
