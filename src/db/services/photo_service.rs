use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::info;

use crate::db::entities::{photo, photo_tag, tag};
use crate::db::services::access::{Caller, scope_owned};
use crate::db::services::tag_service;
use crate::web::error::AppError;

/// A photo together with its attached tags, the shape every photo endpoint
/// returns.
pub type PhotoWithTags = (photo::Model, Vec<tag::Model>);

pub async fn create_photo(
    db: &DatabaseConnection,
    owner_id: i32,
    url: String,
    description: Option<String>,
    tags: &[String],
) -> Result<PhotoWithTags, AppError> {
    let unique = tag_service::dedupe_names(tags);
    if unique.len() > tag_service::TAG_CAP {
        return Err(AppError::TagLimitExceeded);
    }

    let txn = db.begin().await?;

    let photo = photo::ActiveModel {
        url: Set(url),
        description: Set(description),
        user_id: Set(owner_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let tags = tag_service::replace_photo_tags(&txn, photo.id, &unique).await?;
    txn.commit().await?;

    info!(photo_id = photo.id, owner_id, "photo created");
    Ok((photo, tags))
}

pub async fn get_photo(
    db: &DatabaseConnection,
    photo_id: i32,
    caller: &Caller,
) -> Result<PhotoWithTags, AppError> {
    let photo = scope_owned(photo::Entity::find_by_id(photo_id), photo::Column::UserId, caller)
        .one(db)
        .await?
        .ok_or(AppError::PhotoNotFound)?;
    let tags = photo.find_related(tag::Entity).all(db).await?;
    Ok((photo, tags))
}

pub async fn get_photos(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<PhotoWithTags>, AppError> {
    let photos = scope_owned(photo::Entity::find(), photo::Column::UserId, caller)
        .all(db)
        .await?;
    let tags = photos
        .load_many_to_many(tag::Entity, photo_tag::Entity, db)
        .await?;
    Ok(photos.into_iter().zip(tags).collect())
}

/// A user's own photos regardless of role; the posts feed is always personal.
pub async fn get_photos_for_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<PhotoWithTags>, AppError> {
    let photos = photo::Entity::find()
        .filter(photo::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let tags = photos
        .load_many_to_many(tag::Entity, photo_tag::Entity, db)
        .await?;
    Ok(photos.into_iter().zip(tags).collect())
}

/// Applies a partial update: a supplied description replaces the stored one,
/// a supplied tag list replaces the whole tag set (created lazily, capped).
pub async fn update_photo(
    db: &DatabaseConnection,
    photo_id: i32,
    caller: &Caller,
    description: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<PhotoWithTags, AppError> {
    let txn = db.begin().await?;

    let photo = scope_owned(photo::Entity::find_by_id(photo_id), photo::Column::UserId, caller)
        .one(&txn)
        .await?
        .ok_or(AppError::PhotoNotFound)?;

    let mut active: photo::ActiveModel = photo.into();
    if let Some(description) = description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(chrono::Utc::now());
    let photo = active.update(&txn).await?;

    let tags = match tags {
        Some(names) => tag_service::replace_photo_tags(&txn, photo.id, &names).await?,
        None => photo.find_related(tag::Entity).all(&txn).await?,
    };

    txn.commit().await?;
    Ok((photo, tags))
}

pub async fn delete_photo(
    db: &DatabaseConnection,
    photo_id: i32,
    caller: &Caller,
) -> Result<(), AppError> {
    let photo = scope_owned(photo::Entity::find_by_id(photo_id), photo::Column::UserId, caller)
        .one(db)
        .await?
        .ok_or(AppError::PhotoNotFound)?;
    let photo_id = photo.id;
    photo.delete(db).await?;
    info!(photo_id, "photo deleted");
    Ok(())
}
