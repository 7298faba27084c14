use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::db::entities::transformation;
use crate::web::error::AppError;

/// Records a derived-image URL for a photo. Keyed by a generated id so the
/// record survives restarts and is visible to every process.
pub async fn create_transformation(
    db: &DatabaseConnection,
    photo_id: i32,
    applied: String,
    url: String,
) -> Result<transformation::Model, AppError> {
    let record = transformation::ActiveModel {
        id: Set(Uuid::new_v4()),
        photo_id: Set(photo_id),
        transformation: Set(applied),
        url: Set(url),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    Ok(record)
}

pub async fn get_transformations_for_photo(
    db: &DatabaseConnection,
    photo_id: i32,
) -> Result<Vec<transformation::Model>, AppError> {
    let records = transformation::Entity::find()
        .filter(transformation::Column::PhotoId.eq(photo_id))
        .order_by_asc(transformation::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(records)
}
