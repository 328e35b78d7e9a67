//! Settings database operations
//!
//! Provides get/set accessors for settings table following key-value pattern.

use bau_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Settings key holding the NLU service API key
pub const NLU_API_KEY: &str = "nlu_api_key";

/// Get NLU API key from database
///
/// **Returns:** Some(key) if exists, None if not set
pub async fn get_nlu_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting(db, NLU_API_KEY).await
}

/// Set NLU API key in database
pub async fn set_nlu_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, NLU_API_KEY, &key).await
}

/// Setting value; a missing row and a NULL value both read as `None`
async fn get_setting(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await
            .map_err(Error::Database)?;

    Ok(row.and_then(|(value,)| value))
}

/// Insert or replace a setting
async fn set_setting(db: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
