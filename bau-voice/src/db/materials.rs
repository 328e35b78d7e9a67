//! Material transaction database operations

use bau_common::db::NewMaterialTransaction;
use bau_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn save_material_transaction(
    pool: &SqlitePool,
    transaction: &NewMaterialTransaction,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO material_transactions (
            guid, project_id, material_name, quantity, unit, kind, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, 'order', ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(transaction.project_id.to_string())
    .bind(&transaction.material_name)
    .bind(transaction.quantity)
    .bind(&transaction.unit)
    .bind(&transaction.notes)
    .execute(pool)
    .await?;

    tracing::debug!(
        guid = %guid,
        project_id = %transaction.project_id,
        material = %transaction.material_name,
        quantity = transaction.quantity,
        "Created material transaction"
    );

    Ok(guid)
}
