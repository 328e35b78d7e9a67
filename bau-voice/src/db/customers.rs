//! Customer database operations

use bau_common::db::{Customer, NewCustomer};
use bau_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{matches_fragment, parse_guid};

fn customer_from_row(row: &SqliteRow) -> Result<Customer> {
    let guid: String = row.get("guid");

    Ok(Customer {
        id: parse_guid(&guid)?,
        name: row.get("name"),
        street: row.get("street"),
        city: row.get("city"),
        zip_code: row.get("zip_code"),
        created_at: row.get("created_at"),
    })
}

/// Insert a new customer and return the stored record
pub async fn save_customer(pool: &SqlitePool, customer: &NewCustomer) -> Result<Customer> {
    let guid = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO customers (guid, name, street, city, zip_code, created_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(&customer.name)
    .bind(&customer.street)
    .bind(&customer.city)
    .bind(&customer.zip_code)
    .execute(pool)
    .await?;

    tracing::debug!(guid = %guid, name = %customer.name, "Created customer record");

    load_customer(pool, guid)
        .await?
        .ok_or_else(|| Error::Internal(format!("Customer {} vanished after insert", guid)))
}

/// Load customer by id
pub async fn load_customer(pool: &SqlitePool, guid: Uuid) -> Result<Option<Customer>> {
    let row = sqlx::query(
        "SELECT guid, name, street, city, zip_code, created_at FROM customers WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(customer_from_row).transpose()
}

/// Load all customers in insertion order
pub async fn load_customers(pool: &SqlitePool) -> Result<Vec<Customer>> {
    let rows = sqlx::query(
        "SELECT guid, name, street, city, zip_code, created_at FROM customers ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(customer_from_row).collect()
}

/// First customer (insertion order) whose name contains `fragment`
///
/// Filtering happens in Rust because SQLite's `LIKE`/`lower()` only fold
/// ASCII, and customer names are full of umlauts. Only names are scanned;
/// the full row is loaded for the match.
pub async fn find_customer_by_name_fragment(
    pool: &SqlitePool,
    fragment: &str,
) -> Result<Option<Customer>> {
    let names: Vec<(String, String)> =
        sqlx::query_as("SELECT guid, name FROM customers ORDER BY rowid")
            .fetch_all(pool)
            .await?;

    let Some((guid, _)) = names
        .into_iter()
        .find(|(_, name)| matches_fragment(name, fragment))
    else {
        return Ok(None);
    };

    load_customer(pool, parse_guid(&guid)?).await
}
