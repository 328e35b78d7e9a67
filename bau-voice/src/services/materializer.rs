//! Command materializer
//!
//! Performs the write implied by a classified command using the ids the
//! resolver produced. A missing id or required field skips the write; a store
//! error is logged and reported. Neither aborts the request.

use bau_common::db::{NewMaterialTransaction, NewTask, NewTimeEntry, TaskPriority};
use chrono::{Days, Local, NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::Store;
use crate::models::{CommandAction, DashboardCommand, RecordKind, WriteReport};

/// Title of a task created without title or description
pub const DEFAULT_TASK_TITLE: &str = "Neue Aufgabe";

/// Quantity of a material order that names none
pub const DEFAULT_QUANTITY: f64 = 1.0;

const NO_PROJECT: &str = "no project";

#[derive(Clone)]
pub struct Materializer {
    store: Arc<dyn Store>,
}

impl Materializer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Write the record implied by `command`
    ///
    /// `create_project` writes nothing here (resolution already created the
    /// project) and is only reported when no project id is available.
    pub async fn materialize(
        &self,
        command: &DashboardCommand,
        customer_id: Option<Uuid>,
        project_id: Option<Uuid>,
    ) -> Vec<WriteReport> {
        tracing::debug!(
            action = command.action.type_name(),
            customer_id = ?customer_id,
            project_id = ?project_id,
            "Materializing command"
        );

        let report = match &command.action {
            CommandAction::CreateProject { .. } => match project_id {
                Some(_) => return Vec::new(),
                None => WriteReport::skipped(RecordKind::Project, NO_PROJECT),
            },
            CommandAction::CreateTask {
                title,
                description,
                priority,
                due_date,
            } => {
                let Some(project_id) = project_id else {
                    return vec![WriteReport::skipped(RecordKind::Task, NO_PROJECT)];
                };
                let task = NewTask {
                    project_id,
                    title: first_non_blank(&[title, description])
                        .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string()),
                    description: first_non_blank(&[description]),
                    priority: priority
                        .as_deref()
                        .map(TaskPriority::from_spoken)
                        .unwrap_or_default(),
                    due_date: due_date
                        .as_deref()
                        .and_then(|d| parse_date(d, today())),
                };
                self.write_task(&task).await
            }
            CommandAction::AddWorktime {
                date,
                start_time,
                end_time,
                break_minutes,
                description,
            } => {
                let Some(project_id) = project_id else {
                    return vec![WriteReport::skipped(RecordKind::TimeEntry, NO_PROJECT)];
                };
                let today = today();
                let entry = NewTimeEntry {
                    project_id,
                    date: date
                        .as_deref()
                        .and_then(|d| parse_date(d, today))
                        .unwrap_or(today),
                    start_time: start_time.as_deref().and_then(parse_time),
                    end_time: end_time.as_deref().and_then(parse_time),
                    break_minutes: i64::from(break_minutes.unwrap_or(0)),
                    description: first_non_blank(&[description]),
                };
                self.write_time_entry(&entry).await
            }
            CommandAction::CreateMaterialOrder {
                material_name,
                quantity,
                unit,
                notes,
            } => {
                let Some(project_id) = project_id else {
                    return vec![WriteReport::skipped(RecordKind::MaterialTransaction, NO_PROJECT)];
                };
                let Some(material_name) = first_non_blank(&[material_name]) else {
                    return vec![WriteReport::skipped(
                        RecordKind::MaterialTransaction,
                        "no material name",
                    )];
                };
                let transaction = NewMaterialTransaction {
                    project_id,
                    material_name,
                    quantity: quantity
                        .filter(|q| q.is_finite() && *q > 0.0)
                        .unwrap_or(DEFAULT_QUANTITY),
                    unit: first_non_blank(&[unit]),
                    notes: first_non_blank(&[notes]),
                };
                self.write_material_transaction(&transaction).await
            }
        };

        vec![report]
    }

    /// Create one task per title under `project_id`
    ///
    /// Blank titles are ignored. Without a project every title is skipped.
    pub async fn create_tasks(
        &self,
        titles: &[String],
        project_id: Option<Uuid>,
    ) -> Vec<WriteReport> {
        let mut reports = Vec::with_capacity(titles.len());

        for title in titles.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let Some(project_id) = project_id else {
                reports.push(WriteReport::skipped(RecordKind::Task, NO_PROJECT));
                continue;
            };
            let task = NewTask {
                project_id,
                title: title.to_string(),
                description: None,
                priority: TaskPriority::default(),
                due_date: None,
            };
            reports.push(self.write_task(&task).await);
        }

        reports
    }

    async fn write_task(&self, task: &NewTask) -> WriteReport {
        match self.store.insert_task(task).await {
            Ok(id) => {
                info!(
                    task_id = %id,
                    project_id = %task.project_id,
                    title = %task.title,
                    "Created task"
                );
                WriteReport::written(RecordKind::Task, id)
            }
            Err(e) => {
                error!(project_id = %task.project_id, error = %e, "Task insert failed");
                WriteReport::failed(RecordKind::Task, e)
            }
        }
    }

    async fn write_time_entry(&self, entry: &NewTimeEntry) -> WriteReport {
        match self.store.insert_time_entry(entry).await {
            Ok(id) => {
                info!(
                    time_entry_id = %id,
                    project_id = %entry.project_id,
                    date = %entry.date,
                    duration_minutes = ?entry.duration_minutes(),
                    "Created time entry"
                );
                WriteReport::written(RecordKind::TimeEntry, id)
            }
            Err(e) => {
                error!(project_id = %entry.project_id, error = %e, "Time entry insert failed");
                WriteReport::failed(RecordKind::TimeEntry, e)
            }
        }
    }

    async fn write_material_transaction(
        &self,
        transaction: &NewMaterialTransaction,
    ) -> WriteReport {
        match self.store.insert_material_transaction(transaction).await {
            Ok(id) => {
                info!(
                    transaction_id = %id,
                    project_id = %transaction.project_id,
                    material = %transaction.material_name,
                    quantity = transaction.quantity,
                    "Created material order"
                );
                WriteReport::written(RecordKind::MaterialTransaction, id)
            }
            Err(e) => {
                error!(
                    project_id = %transaction.project_id,
                    error = %e,
                    "Material order insert failed"
                );
                WriteReport::failed(RecordKind::MaterialTransaction, e)
            }
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn first_non_blank(values: &[&Option<String>]) -> Option<String> {
    values
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a spoken or model-formatted time of day
///
/// Accepts `07:30`, `7.30`, `7 Uhr`, `7:30 Uhr` and a bare hour.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let lowered = value.trim().to_lowercase();
    let cleaned = lowered.trim_end_matches("uhr").trim().replace('.', ":");

    let (hour, minute) = match cleaned.split_once(':') {
        Some((h, m)) => (h.trim().parse().ok()?, m.trim().parse().ok()?),
        None => (cleaned.parse().ok()?, 0),
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse an ISO (`2024-05-06`) or German (`06.05.2024`) date
///
/// `heute` and `morgen` are taken relative to `today`.
pub fn parse_date(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    let value = value.trim();

    match value.to_lowercase().as_str() {
        "heute" | "today" => return Some(today),
        "morgen" | "tomorrow" => return today.checked_add_days(Days::new(1)),
        _ => {}
    }

    ["%Y-%m-%d", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::models::{EntityRefs, WriteOutcome};
    use crate::services::test_support::FailingStore;
    use sqlx::{Row, SqlitePool};

    fn command(action: CommandAction) -> DashboardCommand {
        DashboardCommand {
            action,
            entities: EntityRefs::default(),
            confidence: 0.9,
        }
    }

    /// Pool with one customer-less project, returning the project id
    async fn setup() -> (SqlitePool, Materializer, Uuid) {
        let pool = bau_common::db::init_in_memory().await.unwrap();
        let project = crate::db::projects::save_project(
            &pool,
            &bau_common::db::NewProject {
                name: "Baustelle Test".to_string(),
                address: "Hauptstraße 5, Hamburg".to_string(),
                customer_id: None,
                status: Default::default(),
            },
        )
        .await
        .unwrap();
        let materializer = Materializer::new(Arc::new(SqliteStore::new(pool.clone())));
        (pool, materializer, project.id)
    }

    fn task_action(
        title: Option<&str>,
        description: Option<&str>,
        priority: Option<&str>,
    ) -> CommandAction {
        CommandAction::CreateTask {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            priority: priority.map(str::to_string),
            due_date: None,
        }
    }

    #[test]
    fn test_parse_time_variants() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0);
        assert_eq!(parse_time("07:30"), t(7, 30));
        assert_eq!(parse_time("7.30"), t(7, 30));
        assert_eq!(parse_time("7 Uhr"), t(7, 0));
        assert_eq!(parse_time("16:45 Uhr"), t(16, 45));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("morgens"), None);
    }

    #[test]
    fn test_parse_date_variants() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_date("2024-05-10", today), NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(parse_date("10.05.2024", today), NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(parse_date("Heute", today), Some(today));
        assert_eq!(parse_date("morgen", today), NaiveDate::from_ymd_opt(2024, 5, 7));
        assert_eq!(parse_date("nächste Woche", today), None);
    }

    #[tokio::test]
    async fn test_missing_project_skips_every_action() {
        let materializer = Materializer::new(Arc::new(FailingStore));
        let actions = [
            CommandAction::empty_project(),
            task_action(Some("Fliesen legen"), None, None),
            CommandAction::AddWorktime {
                date: None,
                start_time: Some("07:00".to_string()),
                end_time: None,
                break_minutes: None,
                description: None,
            },
            CommandAction::CreateMaterialOrder {
                material_name: Some("Zement".to_string()),
                quantity: Some(5.0),
                unit: None,
                notes: None,
            },
        ];

        for action in actions {
            let reports = materializer.materialize(&command(action), None, None).await;
            assert_eq!(reports.len(), 1);
            assert!(matches!(reports[0].outcome, WriteOutcome::Skipped { .. }));
        }
    }

    #[tokio::test]
    async fn test_create_project_with_project_writes_nothing() {
        let (_pool, materializer, project_id) = setup().await;

        let reports = materializer
            .materialize(&command(CommandAction::empty_project()), None, Some(project_id))
            .await;

        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn test_task_written_with_defaults() {
        let (pool, materializer, project_id) = setup().await;

        let reports = materializer
            .materialize(
                &command(task_action(None, Some("Estrich prüfen"), None)),
                None,
                Some(project_id),
            )
            .await;

        let id = reports[0].written_id().unwrap();
        let row =
            sqlx::query("SELECT title, priority, status, project_id FROM tasks WHERE guid = ?")
                .bind(id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(row.get::<String, _>("title"), "Estrich prüfen");
        assert_eq!(row.get::<String, _>("priority"), "medium");
        assert_eq!(row.get::<String, _>("status"), "open");
        assert_eq!(row.get::<String, _>("project_id"), project_id.to_string());
    }

    #[tokio::test]
    async fn test_task_title_falls_back_and_priority_maps() {
        let (pool, materializer, project_id) = setup().await;

        let action = task_action(Some(" "), None, Some("hoch"));
        let reports = materializer
            .materialize(&command(action), None, Some(project_id))
            .await;

        let id = reports[0].written_id().unwrap();
        let row = sqlx::query("SELECT title, priority FROM tasks WHERE guid = ?")
            .bind(id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("title"), DEFAULT_TASK_TITLE);
        assert_eq!(row.get::<String, _>("priority"), "high");
    }

    #[tokio::test]
    async fn test_worktime_written_with_duration() {
        let (pool, materializer, project_id) = setup().await;
        let action = CommandAction::AddWorktime {
            date: Some("06.05.2024".to_string()),
            start_time: Some("7 Uhr".to_string()),
            end_time: Some("16:00".to_string()),
            break_minutes: Some(30),
            description: Some("Trockenbau".to_string()),
        };

        let reports = materializer.materialize(&command(action), None, Some(project_id)).await;

        let id = reports[0].written_id().unwrap();
        let row = sqlx::query("SELECT date, duration_minutes FROM time_entries WHERE guid = ?")
            .bind(id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("date"), "2024-05-06");
        assert_eq!(row.get::<Option<i64>, _>("duration_minutes"), Some(510));
    }

    #[tokio::test]
    async fn test_material_order_defaults_quantity() {
        let (pool, materializer, project_id) = setup().await;
        let action = CommandAction::CreateMaterialOrder {
            material_name: Some("Zement".to_string()),
            quantity: None,
            unit: Some("Sack".to_string()),
            notes: None,
        };

        let reports = materializer.materialize(&command(action), None, Some(project_id)).await;

        let id = reports[0].written_id().unwrap();
        let row = sqlx::query("SELECT quantity, kind FROM material_transactions WHERE guid = ?")
            .bind(id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<f64, _>("quantity"), DEFAULT_QUANTITY);
        assert_eq!(row.get::<String, _>("kind"), "order");
    }

    #[tokio::test]
    async fn test_material_order_without_name_is_skipped() {
        let (_pool, materializer, project_id) = setup().await;
        let action = CommandAction::CreateMaterialOrder {
            material_name: None,
            quantity: Some(3.0),
            unit: None,
            notes: None,
        };

        let reports = materializer.materialize(&command(action), None, Some(project_id)).await;

        assert!(matches!(reports[0].outcome, WriteOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let materializer = Materializer::new(Arc::new(FailingStore));

        let action = task_action(Some("Dach decken"), None, None);
        let reports = materializer
            .materialize(&command(action), None, Some(Uuid::new_v4()))
            .await;

        assert_eq!(reports[0].kind, RecordKind::Task);
        assert!(matches!(reports[0].outcome, WriteOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_create_tasks_one_per_title() {
        let (_pool, materializer, project_id) = setup().await;
        let titles = vec![
            "Alte Fliesen entfernen".to_string(),
            "  ".to_string(),
            "Estrich prüfen".to_string(),
        ];

        let written = materializer.create_tasks(&titles, Some(project_id)).await;
        let skipped = materializer.create_tasks(&titles, None).await;

        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|r| r.written_id().is_some()));
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|r| matches!(r.outcome, WriteOutcome::Skipped { .. })));
    }
}
