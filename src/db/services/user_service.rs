use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::db::entities::user;
use crate::db::enums::Role;
use crate::web::error::AppError;

pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    Ok(user)
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: String,
    email: String,
    password_hash: String,
) -> Result<user::Model, AppError> {
    let avatar = gravatar_url(&email);
    let user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        avatar: Set(Some(avatar)),
        role: Set(Role::User),
        confirmed: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(user_id = user.id, "user registered");
    Ok(user)
}

pub async fn update_refresh_token(
    db: &DatabaseConnection,
    user: user::Model,
    token: Option<String>,
) -> Result<user::Model, AppError> {
    let mut active: user::ActiveModel = user.into();
    active.refresh_token = Set(token);
    let user = active.update(db).await?;
    Ok(user)
}

/// Marks the user as confirmed. A second confirmation is a no-op.
pub async fn confirm_email(db: &DatabaseConnection, email: &str) -> Result<(), AppError> {
    let user = get_user_by_email(db, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if user.confirmed {
        return Ok(());
    }
    let mut active: user::ActiveModel = user.into();
    active.confirmed = Set(true);
    active.update(db).await?;
    Ok(())
}

pub async fn update_avatar_url(
    db: &DatabaseConnection,
    email: &str,
    url: String,
) -> Result<user::Model, AppError> {
    let user = get_user_by_email(db, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    let mut active: user::ActiveModel = user.into();
    active.avatar = Set(Some(url));
    let user = active.update(db).await?;
    Ok(user)
}

/// Gravatar-style default avatar: SHA-256 of the trimmed, lowercased address.
pub fn gravatar_url(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("https://www.gravatar.com/avatar/{digest}?d=identicon")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravatar_url_normalizes_the_address() {
        let a = gravatar_url("User@Example.com ");
        let b = gravatar_url("user@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
    }

    #[test]
    fn gravatar_url_differs_per_address() {
        assert_ne!(gravatar_url("a@example.com"), gravatar_url("b@example.com"));
    }
}
