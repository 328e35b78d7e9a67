//! Database access for bau-voice
//!
//! Free functions per table operate on a `SqlitePool`. The pipeline talks to
//! the database only through the [`Store`] trait so tests can swap in fakes.

pub mod customers;
pub mod materials;
pub mod projects;
pub mod settings;
pub mod tasks;
pub mod time_entries;

use async_trait::async_trait;
use bau_common::db::{
    Customer, NewCustomer, NewMaterialTransaction, NewProject, NewTask, NewTimeEntry, Project,
};
use bau_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Persistence operations the voice pipeline needs
///
/// Lookups return the first match in store order (insertion order).
#[async_trait]
pub trait Store: Send + Sync {
    /// First customer whose name contains `name_fragment` (case-insensitive)
    async fn find_customer(&self, name_fragment: &str) -> Result<Option<Customer>>;

    async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer>;

    /// First project of `customer_id` whose address contains `address_fragment`
    /// (case-insensitive)
    async fn find_project(
        &self,
        customer_id: Uuid,
        address_fragment: &str,
    ) -> Result<Option<Project>>;

    async fn insert_project(&self, project: &NewProject) -> Result<Project>;

    async fn insert_task(&self, task: &NewTask) -> Result<Uuid>;

    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<Uuid>;

    async fn insert_material_transaction(&self, transaction: &NewMaterialTransaction)
        -> Result<Uuid>;
}

/// SQLite-backed [`Store`]
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_customer(&self, name_fragment: &str) -> Result<Option<Customer>> {
        customers::find_customer_by_name_fragment(&self.db, name_fragment).await
    }

    async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        customers::save_customer(&self.db, customer).await
    }

    async fn find_project(
        &self,
        customer_id: Uuid,
        address_fragment: &str,
    ) -> Result<Option<Project>> {
        projects::find_project_by_address_fragment(&self.db, customer_id, address_fragment).await
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project> {
        projects::save_project(&self.db, project).await
    }

    async fn insert_task(&self, task: &NewTask) -> Result<Uuid> {
        tasks::save_task(&self.db, task).await
    }

    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<Uuid> {
        time_entries::save_time_entry(&self.db, entry).await
    }

    async fn insert_material_transaction(
        &self,
        transaction: &NewMaterialTransaction,
    ) -> Result<Uuid> {
        materials::save_material_transaction(&self.db, transaction).await
    }
}

/// Case-insensitive substring test (Unicode lowercase, so "MÜLLER" matches "müller")
///
/// A blank fragment matches nothing.
pub fn matches_fragment(haystack: &str, fragment: &str) -> bool {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&fragment.to_lowercase())
}

/// Parse a TEXT guid column
pub(crate) fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))
}
