use axum::{
    Json, Router,
    extract::{Extension, State},
    routing::get,
};
use std::sync::Arc;

use crate::db::services::{photo_service, user_service};
use crate::services::cloudinary_service::{fill_crop, transform_image};
use crate::web::models::{CurrentUser, PostResponse};
use crate::web::{AppState, error::AppError};

pub fn create_posts_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_posts_handler))
}

/// The caller's photos rendered as a feed: tag names plus derived thumbnail
/// URLs for the avatar (35px and 200px) and the post image (300px).
async fn get_posts_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let author = user_service::get_user_by_email(&app_state.db, &user.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let photos = photo_service::get_photos_for_user(&app_state.db, author.id).await?;

    let ava = match &author.avatar {
        Some(avatar) => vec![
            transform_image(avatar, &fill_crop(35, 35)),
            transform_image(avatar, &fill_crop(200, 200)),
        ],
        None => Vec::new(),
    };

    let posts = photos
        .into_iter()
        .map(|(photo, tags)| PostResponse {
            author: author.username.clone(),
            tags: tags.into_iter().map(|t| t.name).collect(),
            ava: ava.clone(),
            post: transform_image(&photo.url, &fill_crop(300, 300)),
        })
        .collect();

    Ok(Json(posts))
}
