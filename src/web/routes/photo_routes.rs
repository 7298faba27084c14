use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::transformation;
use crate::db::services::{photo_service, tag_service, transformation_service};
use crate::services::cloudinary_service::transform_image;
use crate::web::middleware::rate_limit::{UPLOAD_LIMIT, UPLOAD_WINDOW_SECS};
use crate::web::models::{
    CurrentUser, PhotoResponse, PhotoUpdateRequest, TagsRequest, TransformRequest,
};
use crate::web::{AppState, error::AppError};

pub fn create_photos_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_photos_handler).post(upload_photo_handler))
        .route(
            "/{photo_id}",
            get(get_photo_handler)
                .put(update_photo_handler)
                .delete(delete_photo_handler),
        )
        .route("/{photo_id}/tags", post(add_tags_handler).delete(remove_tags_handler))
        .route("/{photo_id}/transform", post(transform_photo_handler))
        .route("/{photo_id}/transformations", get(list_transformations_handler))
}

/// Multipart upload: a required `file` part, an optional `description` part
/// and any number of `tags` parts (comma-separated names allowed).
async fn upload_photo_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoResponse>), AppError> {
    if !app_state
        .rate_limiter
        .check(user.id, "photo_upload", UPLOAD_LIMIT, UPLOAD_WINDOW_SECS)
    {
        return Err(AppError::RateLimited);
    }

    let mut file: Option<Vec<u8>> = None;
    let mut description: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("failed to read file field: {e}"))
                })?;
                file = Some(bytes.to_vec());
            }
            Some("description") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("failed to read description field: {e}"))
                })?;
                if !text.is_empty() {
                    description = Some(text);
                }
            }
            Some("tags") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("failed to read tags field: {e}"))
                })?;
                tags.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                );
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidInput("file field is required".to_string()))?;

    let public_id = format!("photos/{}", Uuid::new_v4());
    let url = app_state.cloudinary.upload_image(file, &public_id).await?;

    let photo =
        photo_service::create_photo(&app_state.db, user.id, url, description, &tags).await?;
    Ok((StatusCode::CREATED, Json(photo.into())))
}

async fn list_photos_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<PhotoResponse>>, AppError> {
    let photos = photo_service::get_photos(&app_state.db, &user.caller()).await?;
    Ok(Json(photos.into_iter().map(PhotoResponse::from).collect()))
}

async fn get_photo_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo = photo_service::get_photo(&app_state.db, photo_id, &user.caller()).await?;
    Ok(Json(photo.into()))
}

async fn update_photo_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
    Json(payload): Json<PhotoUpdateRequest>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo = photo_service::update_photo(
        &app_state.db,
        photo_id,
        &user.caller(),
        payload.description,
        payload.tags,
    )
    .await?;
    Ok(Json(photo.into()))
}

async fn delete_photo_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    photo_service::delete_photo(&app_state.db, photo_id, &user.caller()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_tags_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
    Json(payload): Json<TagsRequest>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo =
        tag_service::add_tags_to_photo(&app_state.db, photo_id, &user.caller(), &payload.tags)
            .await?;
    Ok(Json(photo.into()))
}

async fn remove_tags_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
    Json(payload): Json<TagsRequest>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo =
        tag_service::remove_tags_from_photo(&app_state.db, photo_id, &user.caller(), &payload.tags)
            .await?;
    Ok(Json(photo.into()))
}

/// Records a derived-image URL for the photo. The derivation fails open, so
/// the recorded URL equals the original when the source URL cannot carry a
/// transformation; callers detect the fallback by comparing the two.
async fn transform_photo_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
    Json(payload): Json<TransformRequest>,
) -> Result<(StatusCode, Json<transformation::Model>), AppError> {
    let (photo, _) = photo_service::get_photo(&app_state.db, photo_id, &user.caller()).await?;

    let crop = payload.crop.as_deref().unwrap_or("fill");
    let applied = format!("w_{},h_{},c_{}", payload.width, payload.height, crop);
    let url = transform_image(&photo.url, &applied);

    let record =
        transformation_service::create_transformation(&app_state.db, photo.id, applied, url)
            .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_transformations_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
) -> Result<Json<Vec<transformation::Model>>, AppError> {
    let (photo, _) = photo_service::get_photo(&app_state.db, photo_id, &user.caller()).await?;
    let records =
        transformation_service::get_transformations_for_photo(&app_state.db, photo.id).await?;
    Ok(Json(records))
}
