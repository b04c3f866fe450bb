//! Custom info repository

use sqlx::PgPool;

use crate::db::models::CustomInfoRow;
use crate::models::user::CustomInfo;

/// Upsert (insert or replace) the custom info for a user
pub async fn upsert(pool: &PgPool, info: &CustomInfo) -> Result<CustomInfoRow, sqlx::Error> {
    let row = sqlx::query_as::<_, CustomInfoRow>(
        r#"
        INSERT INTO custom_info (user_name, email, custom_image)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_name) DO UPDATE SET
            email = EXCLUDED.email,
            custom_image = EXCLUDED.custom_image,
            updated_at = NOW()
        RETURNING user_name, email, custom_image
        "#,
    )
    .bind(&info.user_name)
    .bind(&info.email)
    .bind(&info.custom_image)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
