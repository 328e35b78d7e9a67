//! Work-time entry database operations

use bau_common::db::NewTimeEntry;
use bau_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Insert a time entry; duration is derived from start, end and break
pub async fn save_time_entry(pool: &SqlitePool, entry: &NewTimeEntry) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    let duration_minutes = entry.duration_minutes();

    sqlx::query(
        r#"
        INSERT INTO time_entries (
            guid, project_id, date, start_time, end_time, break_minutes,
            duration_minutes, description, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(entry.project_id.to_string())
    .bind(entry.date.format("%Y-%m-%d").to_string())
    .bind(entry.start_time.map(|t| t.format("%H:%M").to_string()))
    .bind(entry.end_time.map(|t| t.format("%H:%M").to_string()))
    .bind(entry.break_minutes)
    .bind(duration_minutes)
    .bind(&entry.description)
    .execute(pool)
    .await?;

    tracing::debug!(
        guid = %guid,
        project_id = %entry.project_id,
        duration_minutes = ?duration_minutes,
        "Created time entry"
    );

    Ok(guid)
}
