use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::db::entities::comment;
use crate::db::services::comment_service;
use crate::web::models::{CommentCreateQuery, CommentRequest, CurrentUser};
use crate::web::{AppState, error::AppError};

/// Routes that require an authenticated caller.
pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_comment_handler))
        .route("/{comment_id}", put(update_comment_handler).delete(delete_comment_handler))
}

/// Reading a photo's comment thread needs no account.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new().route("/photo/{photo_id}", get(get_comments_by_photo_handler))
}

async fn create_comment_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<CommentCreateQuery>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<comment::Model>), AppError> {
    let comment =
        comment_service::create_comment(&app_state.db, query.photo_id, user.id, payload.content)
            .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update_comment_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<comment::Model>, AppError> {
    let comment =
        comment_service::update_comment(&app_state.db, comment_id, user.id, payload.content)
            .await?;
    Ok(Json(comment))
}

async fn delete_comment_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    comment_service::delete_comment(&app_state.db, comment_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_comments_by_photo_handler(
    State(app_state): State<Arc<AppState>>,
    Path(photo_id): Path<i32>,
) -> Result<Json<Vec<comment::Model>>, AppError> {
    let comments = comment_service::get_comments_for_photo(&app_state.db, photo_id).await?;
    Ok(Json(comments))
}
