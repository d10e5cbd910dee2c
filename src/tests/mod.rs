pub mod unit_tests;

use crate::config::AppConfig;
use crate::database::Database;
use crate::Result;

/// Test helper to create a test database connection
pub async fn create_test_database() -> Result<Database> {
    let config = AppConfig::load()?;
    let database = Database::from_config(&config).await?;
    database.init_schema().await?;
    Ok(database)
}

/// Test helper to clean up documents created by a test run
pub async fn cleanup_test_docs(database: &Database, title_prefix: &str) -> Result<()> {
    sqlx::query("DELETE FROM docs WHERE title LIKE $1 || '%'")
        .bind(title_prefix)
        .execute(database.pool())
        .await?;

    Ok(())
}
