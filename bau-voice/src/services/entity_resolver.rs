//! Entity resolver
//!
//! Maps the customer and site mentioned in a command onto database ids,
//! creating the records on first mention. Matching is a case-insensitive
//! substring test and the first match in insertion order wins; there is no
//! similarity ranking.
//!
//! Store failures are logged and reported as [`Resolution::Failed`]; the
//! caller continues with a null id.

use bau_common::db::{NewCustomer, NewProject, ProjectStatus};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::db::Store;
use crate::models::{EntityRefs, Resolution};

/// Leading forms of address dropped from spoken customer names
const SALUTATIONS: &[&str] = &["herrn", "herr", "frau", "familie", "firma"];

/// Prefix of lazily created project names
pub const PROJECT_NAME_PREFIX: &str = "Baustelle";

#[derive(Clone)]
pub struct EntityResolver {
    store: Arc<dyn Store>,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Find the customer named in `refs`, or create it
    pub async fn resolve_customer(&self, refs: &EntityRefs) -> Resolution {
        let Some(name) = refs.customer_name.as_deref().and_then(normalize_customer_name) else {
            return Resolution::skipped("no customer name");
        };

        match self.store.find_customer(&name).await {
            Ok(Some(customer)) => {
                debug!(customer_id = %customer.id, name = %customer.name, "Matched customer");
                return Resolution::Matched { id: customer.id };
            }
            Ok(None) => {}
            Err(e) => {
                error!(name = %name, error = %e, "Customer lookup failed");
                return Resolution::failed(e);
            }
        }

        let new_customer = NewCustomer {
            name,
            street: non_blank(&refs.street),
            city: non_blank(&refs.city),
            zip_code: non_blank(&refs.zip_code),
        };

        match self.store.insert_customer(&new_customer).await {
            Ok(customer) => {
                info!(customer_id = %customer.id, name = %customer.name, "Created customer");
                Resolution::Created { id: customer.id }
            }
            Err(e) => {
                error!(name = %new_customer.name, error = %e, "Customer insert failed");
                Resolution::failed(e)
            }
        }
    }

    /// Find the customer's project at the street in `refs`, or create it
    ///
    /// Only projects of `customer_id` are considered.
    pub async fn resolve_project(
        &self,
        customer_id: Uuid,
        customer_name: &str,
        refs: &EntityRefs,
    ) -> Resolution {
        let Some(street) = non_blank(&refs.street) else {
            return Resolution::skipped("no street");
        };

        match self.store.find_project(customer_id, &street).await {
            Ok(Some(project)) => {
                debug!(project_id = %project.id, address = %project.address, "Matched project");
                return Resolution::Matched { id: project.id };
            }
            Ok(None) => {}
            Err(e) => {
                error!(customer_id = %customer_id, error = %e, "Project lookup failed");
                return Resolution::failed(e);
            }
        }

        let display_name = normalize_customer_name(customer_name)
            .unwrap_or_else(|| customer_name.trim().to_string());
        let new_project = NewProject {
            name: format!("{} {}", PROJECT_NAME_PREFIX, display_name)
                .trim_end()
                .to_string(),
            address: format_address(refs),
            customer_id: Some(customer_id),
            status: ProjectStatus::Active,
        };

        match self.store.insert_project(&new_project).await {
            Ok(project) => {
                info!(
                    project_id = %project.id,
                    customer_id = %customer_id,
                    name = %project.name,
                    "Created project"
                );
                Resolution::Created { id: project.id }
            }
            Err(e) => {
                error!(customer_id = %customer_id, error = %e, "Project insert failed");
                Resolution::failed(e)
            }
        }
    }
}

/// Trim a spoken customer name and drop a leading salutation
///
/// "Herrn Müller" → "Müller". `None` when nothing is left.
pub fn normalize_customer_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let stripped = trimmed
        .split_once(char::is_whitespace)
        .filter(|(first, _)| SALUTATIONS.contains(&first.to_lowercase().as_str()))
        .map(|(_, rest)| rest.trim_start())
        .unwrap_or(trimmed);

    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Project address: `"<street>, <zip> <city>"`, absent parts left out
pub fn format_address(refs: &EntityRefs) -> String {
    let locality = [non_blank(&refs.zip_code), non_blank(&refs.city)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    [non_blank(&refs.street), Some(locality)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{customers, projects, SqliteStore};
    use crate::services::test_support::FailingStore;
    use sqlx::SqlitePool;

    async fn setup() -> (SqlitePool, EntityResolver) {
        let pool = bau_common::db::init_in_memory().await.unwrap();
        let resolver = EntityResolver::new(Arc::new(SqliteStore::new(pool.clone())));
        (pool, resolver)
    }

    fn refs(
        name: Option<&str>,
        street: Option<&str>,
        zip: Option<&str>,
        city: Option<&str>,
    ) -> EntityRefs {
        EntityRefs {
            customer_name: name.map(str::to_string),
            street: street.map(str::to_string),
            city: city.map(str::to_string),
            zip_code: zip.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_strips_salutation() {
        assert_eq!(normalize_customer_name("Herrn Müller").as_deref(), Some("Müller"));
        assert_eq!(normalize_customer_name("  frau  Schmidt ").as_deref(), Some("Schmidt"));
        assert_eq!(normalize_customer_name("Firma Bau GmbH").as_deref(), Some("Bau GmbH"));
        assert_eq!(normalize_customer_name("Herrmann").as_deref(), Some("Herrmann"));
        assert_eq!(normalize_customer_name("Herr").as_deref(), Some("Herr"));
        assert_eq!(normalize_customer_name("   "), None);
    }

    #[test]
    fn test_format_address() {
        assert_eq!(
            format_address(&refs(None, Some("Hauptstraße 5"), Some("20095"), Some("Hamburg"))),
            "Hauptstraße 5, 20095 Hamburg"
        );
        assert_eq!(
            format_address(&refs(None, Some("Hauptstraße 5"), None, Some("Hamburg"))),
            "Hauptstraße 5, Hamburg"
        );
        assert_eq!(format_address(&refs(None, Some("Hauptstraße 5"), None, None)), "Hauptstraße 5");
    }

    #[tokio::test]
    async fn test_existing_customer_is_not_duplicated() {
        let (pool, resolver) = setup().await;
        let existing = customers::save_customer(
            &pool,
            &NewCustomer {
                name: "Müller".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let resolution = resolver
            .resolve_customer(&refs(Some("Müller"), None, None, None))
            .await;

        assert_eq!(resolution, Resolution::Matched { id: existing.id });
        assert_eq!(customers::load_customers(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_ignores_case_and_salutation() {
        let (pool, resolver) = setup().await;
        let existing = customers::save_customer(
            &pool,
            &NewCustomer {
                name: "Bauunternehmen MÜLLER".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let resolution = resolver
            .resolve_customer(&refs(Some("Herrn müller"), None, None, None))
            .await;

        assert_eq!(resolution.id(), Some(existing.id));
    }

    #[tokio::test]
    async fn test_first_match_in_insertion_order_wins() {
        let (pool, resolver) = setup().await;
        let first = customers::save_customer(
            &pool,
            &NewCustomer {
                name: "Anna Schmidt".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        customers::save_customer(
            &pool,
            &NewCustomer {
                name: "Schmidt".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let resolution = resolver
            .resolve_customer(&refs(Some("Schmidt"), None, None, None))
            .await;

        assert_eq!(resolution.id(), Some(first.id));
    }

    #[tokio::test]
    async fn test_unknown_customer_is_created_once() {
        let (pool, resolver) = setup().await;
        let mention = refs(Some("Frau Weber"), Some("Lindenweg 3"), Some("24103"), Some("Kiel"));

        let first = resolver.resolve_customer(&mention).await;
        let second = resolver.resolve_customer(&mention).await;

        assert!(first.is_created());
        assert_eq!(second, Resolution::Matched { id: first.id().unwrap() });

        let all = customers::load_customers(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Weber");
        assert_eq!(all[0].street.as_deref(), Some("Lindenweg 3"));
        assert_eq!(all[0].zip_code.as_deref(), Some("24103"));
        assert_eq!(all[0].city.as_deref(), Some("Kiel"));
    }

    #[tokio::test]
    async fn test_missing_name_is_skipped() {
        let (pool, resolver) = setup().await;

        let resolution = resolver
            .resolve_customer(&refs(Some("  "), Some("Hauptstraße 5"), None, None))
            .await;

        assert!(matches!(resolution, Resolution::Skipped { .. }));
        assert!(customers::load_customers(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_project_created_with_name_and_address() {
        let (pool, resolver) = setup().await;
        let customer_id = resolver
            .resolve_customer(&refs(Some("Müller"), None, None, None))
            .await
            .id()
            .unwrap();
        let mention = refs(
            Some("Herrn Müller"),
            Some("Hauptstraße 5"),
            Some("20095"),
            Some("Hamburg"),
        );

        let resolution = resolver
            .resolve_project(customer_id, "Herrn Müller", &mention)
            .await;

        let project = projects::load_project(&pool, resolution.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(resolution.is_created());
        assert_eq!(project.name, "Baustelle Müller");
        assert_eq!(project.address, "Hauptstraße 5, 20095 Hamburg");
        assert_eq!(project.customer_id, Some(customer_id));
        assert_eq!(project.status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn test_project_matched_by_street_fragment() {
        let (_pool, resolver) = setup().await;
        let customer_id = resolver
            .resolve_customer(&refs(Some("Müller"), None, None, None))
            .await
            .id()
            .unwrap();

        let created = resolver
            .resolve_project(
                customer_id,
                "Müller",
                &refs(None, Some("Hauptstraße 5"), Some("20095"), Some("Hamburg")),
            )
            .await;
        let again = resolver
            .resolve_project(customer_id, "Müller", &refs(None, Some("hauptstraße 5"), None, None))
            .await;

        assert_eq!(again, Resolution::Matched { id: created.id().unwrap() });
    }

    #[tokio::test]
    async fn test_project_of_other_customer_is_never_returned() {
        let (pool, resolver) = setup().await;
        let mueller = resolver
            .resolve_customer(&refs(Some("Müller"), None, None, None))
            .await
            .id()
            .unwrap();
        let schulz = resolver
            .resolve_customer(&refs(Some("Schulz"), None, None, None))
            .await
            .id()
            .unwrap();
        let site = refs(None, Some("Hauptstraße 5"), None, Some("Hamburg"));

        let theirs = resolver.resolve_project(mueller, "Müller", &site).await;
        let mine = resolver.resolve_project(schulz, "Schulz", &site).await;

        assert!(mine.is_created());
        assert_ne!(mine.id(), theirs.id());
        let project = projects::load_project(&pool, mine.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.customer_id, Some(schulz));
    }

    #[tokio::test]
    async fn test_project_without_street_is_skipped() {
        let (pool, resolver) = setup().await;
        let customer_id = Uuid::new_v4();

        let resolution = resolver
            .resolve_project(customer_id, "Müller", &refs(None, None, None, Some("Hamburg")))
            .await;

        assert!(matches!(resolution, Resolution::Skipped { .. }));
        assert!(projects::load_projects_for_customer(&pool, customer_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_yields_failed_resolution() {
        let resolver = EntityResolver::new(Arc::new(FailingStore));
        let mention = refs(Some("Müller"), Some("Hauptstraße 5"), None, None);

        let customer = resolver.resolve_customer(&mention).await;
        let project = resolver
            .resolve_project(Uuid::new_v4(), "Müller", &mention)
            .await;

        assert!(matches!(customer, Resolution::Failed { .. }));
        assert!(matches!(project, Resolution::Failed { .. }));
        assert_eq!(customer.id(), None);
        assert_eq!(project.id(), None);
    }
}
