//! User image document repository
//!
//! One row per user; the ordered image list is stored as a JSONB document
//! and always read and written as a whole.

use futures::stream::BoxStream;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::UserImagesRow;
use crate::models::user::{ImageEntry, UserRecord};

/// Stream the records for a user name, decoding one row at a time
pub fn stream_by_user_name<'a>(
    pool: &'a PgPool,
    user_name: &'a str,
    limit: i64,
) -> BoxStream<'a, Result<UserImagesRow, sqlx::Error>> {
    sqlx::query_as::<_, UserImagesRow>(
        r#"
        SELECT user_name, image_data
        FROM user_images
        WHERE user_name = $1
        LIMIT $2
        "#,
    )
    .bind(user_name)
    .bind(limit)
    .fetch(pool)
}

/// Get the record for a user name
pub async fn find_by_user_name(
    pool: &PgPool,
    user_name: &str,
) -> Result<Option<UserImagesRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserImagesRow>(
        r#"
        SELECT user_name, image_data
        FROM user_images
        WHERE user_name = $1
        "#,
    )
    .bind(user_name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a new record. Fails with a unique violation if the user already exists.
pub async fn insert(pool: &PgPool, record: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_images (user_name, image_data)
        VALUES ($1, $2)
        "#,
    )
    .bind(&record.user_name)
    .bind(Json(&record.images))
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the stored image list for a user. Returns the number of matched rows.
pub async fn replace_images(
    pool: &PgPool,
    user_name: &str,
    images: &[ImageEntry],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE user_images
        SET image_data = $2, updated_at = NOW()
        WHERE user_name = $1
        "#,
    )
    .bind(user_name)
    .bind(Json(images))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
