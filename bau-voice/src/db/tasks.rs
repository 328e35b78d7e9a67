//! Task database operations

use bau_common::db::NewTask;
use bau_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Insert a task with status `open`
pub async fn save_task(pool: &SqlitePool, task: &NewTask) -> Result<Uuid> {
    let guid = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO tasks (
            guid, project_id, title, description, priority, status, due_date, created_at
        )
        VALUES (?, ?, ?, ?, ?, 'open', ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(task.project_id.to_string())
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority.as_str())
    .bind(task.due_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .execute(pool)
    .await?;

    tracing::debug!(
        guid = %guid,
        project_id = %task.project_id,
        title = %task.title,
        "Created task"
    );

    Ok(guid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bau_common::db::{NewProject, ProjectStatus, TaskPriority};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_save_task() {
        let pool = bau_common::db::init_in_memory().await.unwrap();
        let project = crate::db::projects::save_project(
            &pool,
            &NewProject {
                name: "Baustelle Test".to_string(),
                address: String::new(),
                customer_id: None,
                status: ProjectStatus::Active,
            },
        )
        .await
        .unwrap();

        let guid = save_task(
            &pool,
            &NewTask {
                project_id: project.id,
                title: "Fliesen legen".to_string(),
                description: None,
                priority: TaskPriority::High,
                due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            },
        )
        .await
        .unwrap();

        let (title, priority, status, due_date): (String, String, String, Option<String>) =
            sqlx::query_as("SELECT title, priority, status, due_date FROM tasks WHERE guid = ?")
                .bind(guid.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();

        assert_eq!(title, "Fliesen legen");
        assert_eq!(priority, "high");
        assert_eq!(status, "open");
        assert_eq!(due_date.as_deref(), Some("2024-06-01"));
    }

    #[tokio::test]
    async fn test_save_task_requires_existing_project() {
        let pool = bau_common::db::init_in_memory().await.unwrap();

        let result = save_task(
            &pool,
            &NewTask {
                project_id: Uuid::new_v4(),
                title: "Verwaist".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                due_date: None,
            },
        )
        .await;

        assert!(result.is_err());
    }
}
