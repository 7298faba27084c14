use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{photo, tag, user};
use crate::db::enums::Role;
use crate::db::services::access::Caller;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestEmailRequest {
    pub email: String,
}

// JWT claims. `scope` separates access, refresh and email-confirmation tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub scope: String,
    pub iat: usize,
    pub exp: usize,
}

/// The authenticated user, injected as a request extension by the auth
/// middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn caller(&self) -> Caller {
        Caller { id: self.id, role: self.role }
    }
}

impl From<user::Model> for CurrentUser {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub confirmed: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            role: user.role,
            confirmed: user.confirmed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub id: i32,
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(photo::Model, Vec<tag::Model>)> for PhotoResponse {
    fn from((photo, tags): (photo::Model, Vec<tag::Model>)) -> Self {
        Self {
            id: photo.id,
            url: photo.url,
            description: photo.description,
            tags: tags.into_iter().map(|t| t.name).collect(),
            created_at: photo.created_at,
            updated_at: photo.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PhotoUpdateRequest {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    pub width: u32,
    pub height: u32,
    pub crop: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentCreateQuery {
    pub photo_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactCreateRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: NaiveDate,
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub author: String,
    pub tags: Vec<String>,
    pub ava: Vec<String>,
    pub post: String,
}
