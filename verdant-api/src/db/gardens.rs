//! Garden database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use verdant_common::db::Garden;
use verdant_common::Result;

use super::{parse_timestamp, parse_uuid};

/// Create a garden owned by `user_id`
pub async fn create_garden(pool: &SqlitePool, user_id: &str, name: &str) -> Result<Garden> {
    let garden = Garden {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO gardens (id, user_id, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(garden.id.to_string())
        .bind(&garden.user_id)
        .bind(&garden.name)
        .bind(garden.created_at.to_rfc3339())
        .execute(pool)
        .await?;

    Ok(garden)
}

/// All gardens of one user, oldest first
pub async fn list_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Garden>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, name, created_at
        FROM gardens
        WHERE user_id = ?
        ORDER BY created_at, name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Garden> {
            let id: String = row.try_get("id")?;
            let created_at: String = row.try_get("created_at")?;
            Ok(Garden {
                id: parse_uuid(&id)?,
                user_id: row.try_get("user_id")?,
                name: row.try_get("name")?,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}
