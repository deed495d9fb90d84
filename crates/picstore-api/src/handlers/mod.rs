pub mod health;
pub mod index;
pub mod photo_get;
pub mod photo_upload;
