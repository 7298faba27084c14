use axum::{
    Json, Router,
    extract::{Extension, Multipart, State},
    response::IntoResponse,
    routing::{get, patch},
};
use std::sync::Arc;

use crate::db::services::user_service;
use crate::services::cloudinary_service::{avatar_public_id, fill_crop, transform_image};
use crate::web::models::{CurrentUser, UserResponse};
use crate::web::{AppState, error::AppError};

pub fn create_user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(get_me_handler))
        .route("/avatar", patch(update_avatar_handler))
}

async fn get_me_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service::get_user_by_email(&app_state.db, &user.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    Ok(Json(user.into()))
}

/// Uploads a new avatar image to the image host and stores a 250x250
/// fill-cropped delivery URL on the user.
async fn update_avatar_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("failed to read file field: {e}")))?;
            file = Some(bytes.to_vec());
        }
    }
    let file = file.ok_or_else(|| AppError::InvalidInput("file field is required".to_string()))?;

    let public_id = avatar_public_id(&user.email);
    let url = app_state.cloudinary.upload_image(file, &public_id).await?;
    let avatar_url = transform_image(&url, &fill_crop(250, 250));

    let user = user_service::update_avatar_url(&app_state.db, &user.email, avatar_url).await?;
    Ok(Json(UserResponse::from(user)))
}
