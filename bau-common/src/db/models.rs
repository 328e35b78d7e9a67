//! Row models for customers, projects and the records written on their behalf

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub created_at: String,
}

/// Customer to insert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
}

/// Project (construction site) record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    /// Weak reference, the customer row may be gone
    pub customer_id: Option<Uuid>,
    pub status: ProjectStatus,
    pub created_at: String,
}

/// Project to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub address: String,
    pub customer_id: Option<Uuid>,
    pub status: ProjectStatus,
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        }
    }

    /// Parse the stored representation; unknown values read as `Active`
    pub fn from_db(value: &str) -> Self {
        match value {
            "paused" => ProjectStatus::Paused,
            "completed" => ProjectStatus::Completed,
            _ => ProjectStatus::Active,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Map a spoken or model-produced priority word (English or German)
    ///
    /// Anything unrecognized is `Medium`.
    pub fn from_spoken(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" | "niedrig" | "gering" => TaskPriority::Low,
            "high" | "hoch" | "dringend" | "urgent" | "wichtig" => TaskPriority::High,
            _ => TaskPriority::Medium,
        }
    }
}

/// Task to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
}

/// Work-time entry to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeEntry {
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub break_minutes: i64,
    pub description: Option<String>,
}

impl NewTimeEntry {
    /// Worked minutes: end − start − break
    ///
    /// `None` unless both times are known and the result is positive.
    pub fn duration_minutes(&self) -> Option<i64> {
        let (start, end) = (self.start_time?, self.end_time?);
        let worked = (end - start).num_minutes() - self.break_minutes;
        (worked > 0).then_some(worked)
    }
}

/// Material order to insert (stored with kind `order`)
#[derive(Debug, Clone, PartialEq)]
pub struct NewMaterialTransaction {
    pub project_id: Uuid,
    pub material_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: Option<&str>, end: Option<&str>, break_minutes: i64) -> NewTimeEntry {
        let parse = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        NewTimeEntry {
            project_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            start_time: start.map(parse),
            end_time: end.map(parse),
            break_minutes,
            description: None,
        }
    }

    #[test]
    fn test_duration_subtracts_break() {
        assert_eq!(entry(Some("07:00"), Some("16:00"), 30).duration_minutes(), Some(510));
    }

    #[test]
    fn test_duration_needs_both_times() {
        assert_eq!(entry(Some("07:00"), None, 0).duration_minutes(), None);
        assert_eq!(entry(None, Some("16:00"), 0).duration_minutes(), None);
    }

    #[test]
    fn test_duration_rejects_inverted_range() {
        assert_eq!(entry(Some("16:00"), Some("07:00"), 0).duration_minutes(), None);
    }

    #[test]
    fn test_priority_from_spoken_words() {
        assert_eq!(TaskPriority::from_spoken("Hoch"), TaskPriority::High);
        assert_eq!(TaskPriority::from_spoken("dringend"), TaskPriority::High);
        assert_eq!(TaskPriority::from_spoken("niedrig"), TaskPriority::Low);
        assert_eq!(TaskPriority::from_spoken("irgendwann"), TaskPriority::Medium);
        assert_eq!(serde_json::to_string(&TaskPriority::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn test_project_status_round_trips_db_text() {
        for status in [ProjectStatus::Active, ProjectStatus::Paused, ProjectStatus::Completed] {
            assert_eq!(ProjectStatus::from_db(status.as_str()), status);
        }
        assert_eq!(ProjectStatus::from_db("garbage"), ProjectStatus::Active);
    }
}
