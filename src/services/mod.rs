pub mod auth_service;
pub mod cloudinary_service;
pub mod email_service;
