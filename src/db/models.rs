//! Database row types for PostgreSQL
//!
//! These types map directly to database rows and convert into the API
//! types in models/user.rs

use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::user::{CustomInfo, ImageEntry, UserRecord};

/// `user_images` row, projected to the columns the API exposes
#[derive(Debug, Clone, FromRow)]
pub struct UserImagesRow {
    pub user_name: String,
    pub image_data: Json<Vec<ImageEntry>>,
}

impl From<UserImagesRow> for UserRecord {
    fn from(row: UserImagesRow) -> Self {
        UserRecord {
            user_name: row.user_name,
            images: row.image_data.0,
        }
    }
}

/// `custom_info` row
#[derive(Debug, Clone, FromRow)]
pub struct CustomInfoRow {
    pub user_name: String,
    pub email: Option<String>,
    pub custom_image: Option<String>,
}

impl From<CustomInfoRow> for CustomInfo {
    fn from(row: CustomInfoRow) -> Self {
        CustomInfo {
            email: row.email,
            custom_image: row.custom_image,
            user_name: row.user_name,
        }
    }
}
