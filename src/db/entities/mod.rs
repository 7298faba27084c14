//! SeaORM entities mapping to the database tables.
//!
//! Each entity lives in its own module (`user.rs`, `photo.rs`, ...); the
//! `prelude` re-exports every entity and its related types under short names.

pub mod comment;
pub mod contact;
pub mod photo;
pub mod photo_tag;
pub mod tag;
pub mod transformation;
pub mod user;

pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::photo::Entity as Photo;
    pub use super::photo::Model as PhotoModel;
    pub use super::photo::ActiveModel as PhotoActiveModel;
    pub use super::photo::Column as PhotoColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::photo_tag::Entity as PhotoTag;
    pub use super::photo_tag::Model as PhotoTagModel;
    pub use super::photo_tag::ActiveModel as PhotoTagActiveModel;
    pub use super::photo_tag::Column as PhotoTagColumn;

    pub use super::comment::Entity as Comment;
    pub use super::comment::Model as CommentModel;
    pub use super::comment::ActiveModel as CommentActiveModel;
    pub use super::comment::Column as CommentColumn;

    pub use super::contact::Entity as Contact;
    pub use super::contact::Model as ContactModel;
    pub use super::contact::ActiveModel as ContactActiveModel;
    pub use super::contact::Column as ContactColumn;

    pub use super::transformation::Entity as Transformation;
    pub use super::transformation::Model as TransformationModel;
    pub use super::transformation::ActiveModel as TransformationActiveModel;
    pub use super::transformation::Column as TransformationColumn;
}
