//! Master species database operations
//!
//! Concurrent first sightings of a species converge on one row through the
//! UNIQUE index on `scientific_name` and `ON CONFLICT DO NOTHING`. Do not
//! replace these with select-then-insert.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use verdant_common::db::MasterSpeciesRecord;
use verdant_common::{Error, Result};

use super::{parse_timestamp, parse_uuid};
use crate::store::NewMasterSpecies;

const RECORD_COLUMNS: &str = "id, scientific_name, common_name, all_names, botanical_specs, \
     times_identified, original_contributor_id, created_at, updated_at";

/// Insert a new master record unless the scientific name is already taken
///
/// Returns `None` on conflict. Single statement, atomic at the database.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    new: &NewMasterSpecies,
) -> Result<Option<MasterSpeciesRecord>> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let specs = serde_json::to_string(&new.botanical_specs)?;

    let sql = format!(
        r#"
        INSERT INTO master_plants (
            id, scientific_name, common_name, all_names, botanical_specs,
            times_identified, original_contributor_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)
        ON CONFLICT(scientific_name) DO NOTHING
        RETURNING {}
        "#,
        RECORD_COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(&id)
        .bind(&new.scientific_name)
        .bind(&new.common_name)
        .bind(&new.all_names)
        .bind(&specs)
        .bind(&new.contributor_id)
        .bind(&now)
        .bind(&now)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_record).transpose()
}

/// Load master record by exact scientific name
pub async fn load_by_scientific_name(
    pool: &SqlitePool,
    scientific_name: &str,
) -> Result<Option<MasterSpeciesRecord>> {
    let sql = format!(
        "SELECT {} FROM master_plants WHERE scientific_name = ?",
        RECORD_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(scientific_name)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_record).transpose()
}

/// Load master record by id
pub async fn load_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<MasterSpeciesRecord>> {
    let sql = format!("SELECT {} FROM master_plants WHERE id = ?", RECORD_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_record).transpose()
}

/// Add one to `times_identified` in place; returns the new count
pub async fn increment_times_identified(pool: &SqlitePool, id: Uuid) -> Result<i64> {
    let count: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE master_plants
        SET times_identified = times_identified + 1,
            updated_at = ?
        WHERE id = ?
        RETURNING times_identified
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    count.ok_or_else(|| Error::NotFound(format!("master plant {}", id)))
}

fn row_to_record(row: &SqliteRow) -> Result<MasterSpeciesRecord> {
    let id: String = row.try_get("id")?;
    let specs: String = row.try_get("botanical_specs")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(MasterSpeciesRecord {
        id: parse_uuid(&id)?,
        scientific_name: row.try_get("scientific_name")?,
        common_name: row.try_get("common_name")?,
        all_names: row.try_get("all_names")?,
        botanical_specs: serde_json::from_str(&specs)?,
        times_identified: row.try_get("times_identified")?,
        original_contributor_id: row.try_get("original_contributor_id")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verdant_common::db::init_memory_database;

    fn new_species(name: &str, contributor: &str) -> NewMasterSpecies {
        NewMasterSpecies {
            scientific_name: name.to_string(),
            common_name: Some("Fiddle-leaf fig".to_string()),
            all_names: None,
            botanical_specs: json!({ "contributor": contributor }),
            contributor_id: contributor.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_conflict() {
        let pool = init_memory_database().await.unwrap();

        let first = insert_if_absent(&pool, &new_species("Ficus lyrata", "u1"))
            .await
            .unwrap()
            .expect("first insert creates the record");
        assert_eq!(first.times_identified, 1);
        assert_eq!(first.original_contributor_id, "u1");

        let second = insert_if_absent(&pool, &new_species("Ficus lyrata", "u2"))
            .await
            .unwrap();
        assert!(second.is_none(), "conflict must not insert");

        let loaded = load_by_scientific_name(&pool, "Ficus lyrata")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, first.id);
        assert_eq!(loaded.botanical_specs, json!({ "contributor": "u1" }));
        assert_eq!(loaded.original_contributor_id, "u1");
    }

    #[tokio::test]
    async fn test_increment() {
        let pool = init_memory_database().await.unwrap();
        let record = insert_if_absent(&pool, &new_species("Aloe vera", "u1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(increment_times_identified(&pool, record.id).await.unwrap(), 2);
        assert_eq!(increment_times_identified(&pool, record.id).await.unwrap(), 3);

        let loaded = load_by_id(&pool, record.id).await.unwrap().unwrap();
        assert_eq!(loaded.times_identified, 3);
    }

    #[tokio::test]
    async fn test_increment_unknown_id() {
        let pool = init_memory_database().await.unwrap();

        let err = increment_times_identified(&pool, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let pool = init_memory_database().await.unwrap();
        insert_if_absent(&pool, &new_species("Ficus lyrata", "u1"))
            .await
            .unwrap();

        assert!(load_by_scientific_name(&pool, "ficus lyrata")
            .await
            .unwrap()
            .is_none());
    }
}
