//! Tests for database initialization and schema constraints

use tempfile::TempDir;
use verdant_common::db::init::{init_database, init_memory_database};

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sub").join("verdant.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("verdant.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_schema_tables_exist() {
    let pool = init_memory_database().await.unwrap();

    let tables = table_names(&pool).await;

    for expected in ["gardens", "master_plants", "user_gardens"] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_scientific_name_is_unique() {
    let pool = init_memory_database().await.unwrap();

    let insert = r#"
        INSERT INTO master_plants
            (id, scientific_name, botanical_specs, times_identified,
             original_contributor_id, created_at, updated_at)
        VALUES (?, 'Ficus lyrata', '{}', 1, 'u1', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')
    "#;

    sqlx::query(insert).bind("a").execute(&pool).await.unwrap();
    let second = sqlx::query(insert).bind("b").execute(&pool).await;

    let err = second.expect_err("duplicate scientific_name must be rejected");
    assert!(verdant_common::Error::from(err).is_unique_violation());
}

#[tokio::test]
async fn test_garden_entry_requires_existing_master_plant() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query(
        r#"
        INSERT INTO user_gardens
            (id, garden_id, user_id, master_plant_id, is_in_pot, created_at)
        VALUES ('e1', 'g1', 'u1', 'no-such-master', 1, '2026-01-01T00:00:00Z')
        "#,
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "foreign key on master_plant_id should be enforced");
}
