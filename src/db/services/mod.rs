//! High-level data-access API over the SeaORM entities.
//!
//! Each sub-module owns one aggregate (users, photos, tags, ...). Route
//! handlers call these functions and never touch queries directly; the
//! ownership rules live in [`access`] and are applied here, not in the web
//! layer.

pub mod access;
pub mod comment_service;
pub mod contact_service;
pub mod photo_service;
pub mod tag_service;
pub mod transformation_service;
pub mod user_service;
