use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use crate::db::entities::contact;
use crate::db::services::contact_service::{self, ContactData, ContactPatch};
use crate::web::models::{
    ContactCreateRequest, ContactListQuery, ContactUpdateRequest, CurrentUser, SearchQuery,
};
use crate::web::{AppState, error::AppError};

pub fn create_contacts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_contacts_handler).post(create_contact_handler))
        .route(
            "/{contact_id}",
            get(get_contact_handler)
                .put(update_contact_handler)
                .delete(remove_contact_handler),
        )
        .route("/search/", get(search_contacts_handler))
        .route("/birthdays/", get(get_upcoming_birthdays_handler))
}

async fn get_contacts_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<Vec<contact::Model>>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(10, 500);
    let offset = query.offset.unwrap_or(0);
    let contacts = contact_service::get_contacts(&app_state.db, user.id, limit, offset).await?;
    Ok(Json(contacts))
}

async fn get_contact_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(contact_id): Path<i32>,
) -> Result<Json<contact::Model>, AppError> {
    let contact = contact_service::get_contact(&app_state.db, contact_id, user.id).await?;
    Ok(Json(contact))
}

async fn create_contact_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ContactCreateRequest>,
) -> Result<(StatusCode, Json<contact::Model>), AppError> {
    let data = ContactData {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        birthday: payload.birthday,
        additional_info: payload.additional_info,
    };
    let contact = contact_service::create_contact(&app_state.db, user.id, data).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn update_contact_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(contact_id): Path<i32>,
    Json(payload): Json<ContactUpdateRequest>,
) -> Result<Json<contact::Model>, AppError> {
    let patch = ContactPatch {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        birthday: payload.birthday,
        additional_info: payload.additional_info,
    };
    let contact =
        contact_service::update_contact(&app_state.db, contact_id, user.id, patch).await?;
    Ok(Json(contact))
}

async fn remove_contact_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(contact_id): Path<i32>,
) -> Result<Json<contact::Model>, AppError> {
    let contact = contact_service::remove_contact(&app_state.db, contact_id, user.id).await?;
    Ok(Json(contact))
}

async fn search_contacts_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<contact::Model>>, AppError> {
    let contacts = contact_service::search_contacts(&app_state.db, user.id, &query.query).await?;
    Ok(Json(contacts))
}

async fn get_upcoming_birthdays_handler(
    Extension(user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<contact::Model>>, AppError> {
    let today = chrono::Utc::now().date_naive();
    let contacts =
        contact_service::birthdays_within_next_week(&app_state.db, user.id, today).await?;
    Ok(Json(contacts))
}
