use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::entities::{comment, photo};
use crate::web::error::AppError;

pub async fn create_comment(
    db: &DatabaseConnection,
    photo_id: i32,
    user_id: i32,
    content: String,
) -> Result<comment::Model, AppError> {
    // Commenting is allowed on any photo, but it has to exist.
    photo::Entity::find_by_id(photo_id)
        .one(db)
        .await?
        .ok_or(AppError::PhotoNotFound)?;

    let comment = comment::ActiveModel {
        content: Set(content),
        user_id: Set(user_id),
        photo_id: Set(photo_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(comment)
}

pub async fn update_comment(
    db: &DatabaseConnection,
    comment_id: i32,
    user_id: i32,
    content: String,
) -> Result<comment::Model, AppError> {
    let existing = owned_comment(db, comment_id, user_id).await?;

    let mut comment: comment::ActiveModel = existing.into();
    comment.content = Set(content);
    comment.updated_at = Set(chrono::Utc::now());
    let comment = comment.update(db).await?;
    Ok(comment)
}

pub async fn delete_comment(
    db: &DatabaseConnection,
    comment_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let comment = owned_comment(db, comment_id, user_id).await?;
    comment.delete(db).await?;
    Ok(())
}

pub async fn get_comments_for_photo(
    db: &DatabaseConnection,
    photo_id: i32,
) -> Result<Vec<comment::Model>, AppError> {
    let comments = comment::Entity::find()
        .filter(comment::Column::PhotoId.eq(photo_id))
        .order_by_asc(comment::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(comments)
}

/// A missing comment and someone else's comment are indistinguishable to the
/// caller: both come back as not-found.
async fn owned_comment(
    db: &DatabaseConnection,
    comment_id: i32,
    user_id: i32,
) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(comment_id)
        .filter(comment::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(AppError::CommentNotFound)
}
