//! Project (construction site) database operations

use bau_common::db::{NewProject, Project, ProjectStatus};
use bau_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{matches_fragment, parse_guid};

fn project_from_row(row: &SqliteRow) -> Result<Project> {
    let guid: String = row.get("guid");
    let customer_id: Option<String> = row.get("customer_id");
    let status: String = row.get("status");

    Ok(Project {
        id: parse_guid(&guid)?,
        name: row.get("name"),
        address: row.get("address"),
        customer_id: customer_id.as_deref().map(parse_guid).transpose()?,
        status: ProjectStatus::from_db(&status),
        created_at: row.get("created_at"),
    })
}

/// Insert a new project and return the stored record
pub async fn save_project(pool: &SqlitePool, project: &NewProject) -> Result<Project> {
    let guid = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO projects (guid, name, address, customer_id, status, created_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(&project.name)
    .bind(&project.address)
    .bind(project.customer_id.map(|id| id.to_string()))
    .bind(project.status.as_str())
    .execute(pool)
    .await?;

    tracing::debug!(
        guid = %guid,
        name = %project.name,
        address = %project.address,
        "Created project record"
    );

    load_project(pool, guid)
        .await?
        .ok_or_else(|| Error::Internal(format!("Project {} vanished after insert", guid)))
}

/// Load project by id
pub async fn load_project(pool: &SqlitePool, guid: Uuid) -> Result<Option<Project>> {
    let row = sqlx::query(
        "SELECT guid, name, address, customer_id, status, created_at FROM projects WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(project_from_row).transpose()
}

/// Load a customer's projects in insertion order
pub async fn load_projects_for_customer(
    pool: &SqlitePool,
    customer_id: Uuid,
) -> Result<Vec<Project>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, name, address, customer_id, status, created_at
        FROM projects
        WHERE customer_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(customer_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(project_from_row).collect()
}

/// First project of `customer_id` (insertion order) whose address contains `fragment`
pub async fn find_project_by_address_fragment(
    pool: &SqlitePool,
    customer_id: Uuid,
    fragment: &str,
) -> Result<Option<Project>> {
    let projects = load_projects_for_customer(pool, customer_id).await?;

    Ok(projects
        .into_iter()
        .find(|project| matches_fragment(&project.address, fragment)))
}
