//! Database repositories
//!
//! Repository pattern for database access, separating data access logic
//! from business logic.

pub mod custom_info;
pub mod user_images;
