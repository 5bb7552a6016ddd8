//! Garden entry database operations

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use verdant_common::db::GardenEntry;
use verdant_common::Result;

use crate::store::NewGardenEntry;

/// Insert one garden entry row
pub async fn insert_entry(pool: &SqlitePool, new: &NewGardenEntry) -> Result<GardenEntry> {
    let entry = GardenEntry {
        id: Uuid::new_v4(),
        garden_id: new.garden_id.clone(),
        user_id: new.user_id.clone(),
        master_plant_id: new.master_plant_id,
        nickname: new.nickname.clone(),
        health_status: new.health_status.clone(),
        is_in_pot: new.is_in_pot,
        photo_url: new.photo_url.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO user_gardens (
            id, garden_id, user_id, master_plant_id, nickname,
            health_status, is_in_pot, image_url, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(&entry.garden_id)
    .bind(&entry.user_id)
    .bind(entry.master_plant_id.to_string())
    .bind(&entry.nickname)
    .bind(&entry.health_status)
    .bind(entry.is_in_pot)
    .bind(&entry.photo_url)
    .bind(entry.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(entry)
}
