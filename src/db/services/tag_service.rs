use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::db::entities::{photo, photo_tag, tag};
use crate::db::services::access::{Caller, scope_owned};
use crate::web::error::AppError;

/// Maximum number of distinct tags permitted on one photo.
pub const TAG_CAP: usize = 5;

/// Computes the subset of `requested` that is not already attached, preserving
/// request order and dropping duplicates within the request itself. Comparison
/// is exact and case-sensitive.
pub fn validate_new_tags(
    existing: &[String],
    requested: &[String],
    cap: usize,
) -> Result<Vec<String>, AppError> {
    let mut unique_new: Vec<String> = Vec::new();
    for name in requested {
        if existing.contains(name) || unique_new.contains(name) {
            continue;
        }
        unique_new.push(name.clone());
    }
    if existing.len() + unique_new.len() > cap {
        return Err(AppError::TagLimitExceeded);
    }
    if unique_new.is_empty() {
        return Err(AppError::NoNewTags);
    }
    Ok(unique_new)
}

/// Intersects the attached tags with the requested names. Fails when nothing
/// matches; tag rows themselves are never touched here.
pub fn match_tags_for_removal(
    attached: &[tag::Model],
    names: &[String],
) -> Result<Vec<tag::Model>, AppError> {
    let matched: Vec<tag::Model> = attached
        .iter()
        .filter(|t| names.contains(&t.name))
        .cloned()
        .collect();
    if matched.is_empty() {
        return Err(AppError::NoMatchingTags);
    }
    Ok(matched)
}

/// Deduplicates a requested tag list, preserving first occurrence.
pub fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for name in names {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}

/// Looks up tags by exact name, creating the missing ones.
///
/// The create step is an insert-if-absent keyed by the unique `name` column
/// followed by a reselect, so two concurrent callers requesting the same new
/// name cannot produce duplicate rows.
pub async fn get_or_create_tags<C>(db: &C, names: &[String]) -> Result<Vec<tag::Model>, AppError>
where
    C: ConnectionTrait,
{
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<tag::ActiveModel> = names
        .iter()
        .map(|name| tag::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        })
        .collect();

    tag::Entity::insert_many(rows)
        .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    let mut tags = tag::Entity::find()
        .filter(tag::Column::Name.is_in(names.iter().cloned()))
        .all(db)
        .await?;
    tags.sort_by_key(|t| names.iter().position(|n| *n == t.name).unwrap_or(usize::MAX));
    Ok(tags)
}

/// Attaches the genuinely new tags from `names` to the photo.
///
/// Runs in a single transaction and re-reads the current tag set inside it, so
/// two concurrent tag edits on the same photo cannot lose each other's writes.
pub async fn add_tags_to_photo(
    db: &DatabaseConnection,
    photo_id: i32,
    caller: &Caller,
    names: &[String],
) -> Result<(photo::Model, Vec<tag::Model>), AppError> {
    let txn = db.begin().await?;

    let photo = scope_owned(photo::Entity::find_by_id(photo_id), photo::Column::UserId, caller)
        .one(&txn)
        .await?
        .ok_or(AppError::PhotoNotFound)?;

    let attached = photo.find_related(tag::Entity).all(&txn).await?;
    let existing: Vec<String> = attached.iter().map(|t| t.name.clone()).collect();
    let new_names = validate_new_tags(&existing, names, TAG_CAP)?;

    let new_tags = get_or_create_tags(&txn, &new_names).await?;
    link_tags(&txn, photo.id, &new_tags).await?;
    debug!(photo_id = photo.id, added = new_tags.len(), "attached tags to photo");

    let tags = photo.find_related(tag::Entity).all(&txn).await?;
    txn.commit().await?;
    Ok((photo, tags))
}

/// Detaches the named tags from the photo. Only the association rows are
/// deleted; the tag rows stay for reuse by other photos.
pub async fn remove_tags_from_photo(
    db: &DatabaseConnection,
    photo_id: i32,
    caller: &Caller,
    names: &[String],
) -> Result<(photo::Model, Vec<tag::Model>), AppError> {
    let txn = db.begin().await?;

    let photo = scope_owned(photo::Entity::find_by_id(photo_id), photo::Column::UserId, caller)
        .one(&txn)
        .await?
        .ok_or(AppError::PhotoNotFound)?;

    let attached = photo.find_related(tag::Entity).all(&txn).await?;
    let matched = match_tags_for_removal(&attached, names)?;
    let matched_ids: Vec<i32> = matched.iter().map(|t| t.id).collect();

    photo_tag::Entity::delete_many()
        .filter(photo_tag::Column::PhotoId.eq(photo.id))
        .filter(photo_tag::Column::TagId.is_in(matched_ids))
        .exec(&txn)
        .await?;
    debug!(photo_id = photo.id, removed = matched.len(), "detached tags from photo");

    let tags = photo.find_related(tag::Entity).all(&txn).await?;
    txn.commit().await?;
    Ok((photo, tags))
}

/// Replaces the photo's whole tag set with `names` (deduplicated, capped).
/// Used by the photo update path, inside the caller's transaction.
pub async fn replace_photo_tags<C>(
    db: &C,
    photo_id: i32,
    names: &[String],
) -> Result<Vec<tag::Model>, AppError>
where
    C: ConnectionTrait,
{
    let unique = dedupe_names(names);
    if unique.len() > TAG_CAP {
        return Err(AppError::TagLimitExceeded);
    }

    photo_tag::Entity::delete_many()
        .filter(photo_tag::Column::PhotoId.eq(photo_id))
        .exec(db)
        .await?;

    let tags = get_or_create_tags(db, &unique).await?;
    link_tags(db, photo_id, &tags).await?;
    Ok(tags)
}

async fn link_tags<C>(db: &C, photo_id: i32, tags: &[tag::Model]) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    if tags.is_empty() {
        return Ok(());
    }
    let links: Vec<photo_tag::ActiveModel> = tags
        .iter()
        .map(|t| photo_tag::ActiveModel {
            photo_id: Set(photo_id),
            tag_id: Set(t.id),
        })
        .collect();
    photo_tag::Entity::insert_many(links)
        .on_conflict(
            OnConflict::columns([photo_tag::Column::PhotoId, photo_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn tag_models(items: &[(i32, &str)]) -> Vec<tag::Model> {
        items
            .iter()
            .map(|(id, name)| tag::Model { id: *id, name: name.to_string() })
            .collect()
    }

    #[test]
    fn new_tags_preserve_request_order() {
        let existing = names(&["sea", "sunset"]);
        let requested = names(&["sunset", "forest", "beach", "sky"]);
        let new = validate_new_tags(&existing, &requested, TAG_CAP).unwrap();
        assert_eq!(new, names(&["forest", "beach", "sky"]));
    }

    #[test]
    fn duplicates_within_request_are_dropped() {
        let existing = names(&["sea"]);
        let requested = names(&["forest", "forest", "beach"]);
        let new = validate_new_tags(&existing, &requested, TAG_CAP).unwrap();
        assert_eq!(new, names(&["forest", "beach"]));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let existing = names(&["Sunset"]);
        let new = validate_new_tags(&existing, &names(&["sunset"]), TAG_CAP).unwrap();
        assert_eq!(new, names(&["sunset"]));
    }

    #[test]
    fn cap_is_enforced_across_existing_and_new() {
        let existing = names(&["a", "b", "c"]);
        let requested = names(&["d", "e", "f"]);
        let err = validate_new_tags(&existing, &requested, TAG_CAP).unwrap_err();
        assert!(matches!(err, AppError::TagLimitExceeded));
    }

    #[test]
    fn filling_up_to_the_cap_is_allowed() {
        let existing = names(&["sea", "sunset"]);
        let requested = names(&["sunset", "forest", "beach", "sky"]);
        let new = validate_new_tags(&existing, &requested, TAG_CAP).unwrap();
        assert_eq!(existing.len() + new.len(), TAG_CAP);

        let full: Vec<String> = existing.iter().chain(new.iter()).cloned().collect();
        let err = validate_new_tags(&full, &names(&["mountain"]), TAG_CAP).unwrap_err();
        assert!(matches!(err, AppError::TagLimitExceeded));
    }

    #[test]
    fn requested_subset_of_existing_fails() {
        let existing = names(&["sea", "sunset"]);
        let err = validate_new_tags(&existing, &names(&["sunset", "sea"]), TAG_CAP).unwrap_err();
        assert!(matches!(err, AppError::NoNewTags));

        let err = validate_new_tags(&existing, &[], TAG_CAP).unwrap_err();
        assert!(matches!(err, AppError::NoNewTags));
    }

    #[test]
    fn removal_matches_by_name() {
        let attached = tag_models(&[(1, "sea"), (2, "sunset"), (3, "sky")]);
        let matched = match_tags_for_removal(&attached, &names(&["sunset", "absent"])).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "sunset");
    }

    #[test]
    fn removal_without_matches_fails() {
        let attached = tag_models(&[(1, "sea")]);
        let err = match_tags_for_removal(&attached, &names(&["forest"])).unwrap_err();
        assert!(matches!(err, AppError::NoMatchingTags));

        let err = match_tags_for_removal(&attached, &[]).unwrap_err();
        assert!(matches!(err, AppError::NoMatchingTags));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let unique = dedupe_names(&names(&["b", "a", "b", "c", "a"]));
        assert_eq!(unique, names(&["b", "a", "c"]));
    }
}
