use chrono::{Datelike, Days, NaiveDate};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QuerySelect, Set,
};

use crate::db::entities::contact;
use crate::web::error::AppError;

/// Fields accepted when creating a contact.
#[derive(Debug, Clone)]
pub struct ContactData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: NaiveDate,
    pub additional_info: Option<String>,
}

/// Partial update: only supplied fields are applied, the rest keep their
/// stored values.
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub additional_info: Option<String>,
}

/// True when the birthday's month-day falls inside the inclusive window
/// `[today, today + 7 days]`, ignoring the year.
///
/// When the window crosses the year boundary (e.g. Dec 28 → Jan 4) the check
/// splits into the tail of December and the head of January. Feb 29 birthdays
/// are compared raw, with no leap-year special-casing.
pub fn in_upcoming_week(today: NaiveDate, birthday: NaiveDate) -> bool {
    let window_end = today + Days::new(7);
    let bday = (birthday.month(), birthday.day());
    let start = (today.month(), today.day());
    let end = (window_end.month(), window_end.day());

    if today.month() <= window_end.month() {
        bday >= start && bday <= end
    } else {
        (bday >= start && bday <= (12, 31)) || (bday >= (1, 1) && bday <= end)
    }
}

pub async fn get_contacts(
    db: &DatabaseConnection,
    user_id: i32,
    limit: u64,
    offset: u64,
) -> Result<Vec<contact::Model>, AppError> {
    let contacts = contact::Entity::find()
        .filter(contact::Column::UserId.eq(user_id))
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok(contacts)
}

pub async fn get_contact(
    db: &DatabaseConnection,
    contact_id: i32,
    user_id: i32,
) -> Result<contact::Model, AppError> {
    contact::Entity::find_by_id(contact_id)
        .filter(contact::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(AppError::ContactNotFound)
}

pub async fn create_contact(
    db: &DatabaseConnection,
    user_id: i32,
    data: ContactData,
) -> Result<contact::Model, AppError> {
    let contact = contact::ActiveModel {
        first_name: Set(data.first_name),
        last_name: Set(data.last_name),
        email: Set(data.email),
        phone: Set(data.phone),
        birthday: Set(data.birthday),
        additional_info: Set(data.additional_info),
        user_id: Set(user_id),
        ..Default::default()
    };
    let contact = contact.insert(db).await?;
    Ok(contact)
}

pub async fn update_contact(
    db: &DatabaseConnection,
    contact_id: i32,
    user_id: i32,
    patch: ContactPatch,
) -> Result<contact::Model, AppError> {
    let existing = get_contact(db, contact_id, user_id).await?;

    let mut contact: contact::ActiveModel = existing.into();
    if let Some(first_name) = patch.first_name {
        contact.first_name = Set(first_name);
    }
    if let Some(last_name) = patch.last_name {
        contact.last_name = Set(last_name);
    }
    if let Some(email) = patch.email {
        contact.email = Set(email);
    }
    if let Some(phone) = patch.phone {
        contact.phone = Set(phone);
    }
    if let Some(birthday) = patch.birthday {
        contact.birthday = Set(birthday);
    }
    if let Some(additional_info) = patch.additional_info {
        contact.additional_info = Set(Some(additional_info));
    }
    contact.updated_at = Set(chrono::Utc::now());

    let contact = contact.update(db).await?;
    Ok(contact)
}

pub async fn remove_contact(
    db: &DatabaseConnection,
    contact_id: i32,
    user_id: i32,
) -> Result<contact::Model, AppError> {
    let contact = get_contact(db, contact_id, user_id).await?;
    contact.clone().delete(db).await?;
    Ok(contact)
}

/// Case-insensitive substring search over first name, last name and email,
/// always scoped to the caller's own contacts.
pub async fn search_contacts(
    db: &DatabaseConnection,
    user_id: i32,
    query: &str,
) -> Result<Vec<contact::Model>, AppError> {
    let pattern = format!("%{query}%");
    let contacts = contact::Entity::find()
        .filter(contact::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(Expr::col(contact::Column::FirstName).ilike(pattern.clone()))
                .add(Expr::col(contact::Column::LastName).ilike(pattern.clone()))
                .add(Expr::col(contact::Column::Email).ilike(pattern)),
        )
        .all(db)
        .await?;
    Ok(contacts)
}

/// Contacts whose birthday falls within the next 7 days (inclusive), the
/// window predicate evaluated per contact against the caller's full set.
pub async fn birthdays_within_next_week(
    db: &DatabaseConnection,
    user_id: i32,
    today: NaiveDate,
) -> Result<Vec<contact::Model>, AppError> {
    let contacts = contact::Entity::find()
        .filter(contact::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(contacts
        .into_iter()
        .filter(|c| in_upcoming_week(today, c.birthday))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inside_a_plain_window() {
        assert!(in_upcoming_week(date(2024, 6, 20), date(1990, 6, 25)));
        assert!(in_upcoming_week(date(2024, 6, 20), date(1990, 6, 20)));
        assert!(in_upcoming_week(date(2024, 6, 20), date(1990, 6, 27)));
    }

    #[test]
    fn outside_a_plain_window() {
        assert!(!in_upcoming_week(date(2024, 6, 20), date(1990, 7, 1)));
        assert!(!in_upcoming_week(date(2024, 6, 20), date(1990, 6, 19)));
    }

    #[test]
    fn wraparound_window_covers_both_segments() {
        assert!(in_upcoming_week(date(2024, 12, 28), date(1990, 1, 2)));
        assert!(in_upcoming_week(date(2024, 12, 28), date(1990, 12, 31)));
        assert!(in_upcoming_week(date(2024, 12, 28), date(1990, 1, 4)));
    }

    #[test]
    fn wraparound_window_excludes_the_middle_of_the_year() {
        assert!(!in_upcoming_week(date(2024, 12, 28), date(1990, 6, 15)));
        assert!(!in_upcoming_week(date(2024, 12, 28), date(1990, 1, 5)));
        assert!(!in_upcoming_week(date(2024, 12, 28), date(1990, 12, 27)));
    }

    #[test]
    fn month_boundary_without_year_wrap() {
        assert!(in_upcoming_week(date(2024, 1, 28), date(1990, 2, 3)));
        assert!(!in_upcoming_week(date(2024, 1, 28), date(1990, 2, 5)));
    }

    #[test]
    fn feb_29_is_compared_raw() {
        assert!(in_upcoming_week(date(2023, 2, 25), date(1996, 2, 29)));
        assert!(!in_upcoming_week(date(2023, 3, 2), date(1996, 2, 29)));
    }
}
