//! Structured commands produced by the classifier
//!
//! Wire format is camelCase JSON. The dashboard command is tagged by `type`
//! (`create_project`, `create_task`, `add_worktime`, `create_material_order`).
//! Absent optional fields are omitted when serializing.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Confidence used when the NLU reply omits it
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// Number as models write it: a JSON number, a numeric string (`"5"`,
/// `"2,5"`), `null`, or something unusable
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl LooseNumber {
    fn value(self) -> Option<f64> {
        let value: Option<f64> = match self {
            LooseNumber::Number(n) => Some(n),
            LooseNumber::Text(text) => text.trim().replace(',', ".").parse().ok(),
            LooseNumber::Other(_) => None,
        };
        value.filter(|n| n.is_finite())
    }
}

fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<LooseNumber>::deserialize(deserializer)?.and_then(LooseNumber::value))
}

fn loose_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(loose_number(deserializer)?
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32))
}

/// `null`, a missing key or an unreadable value all mean [`DEFAULT_CONFIDENCE`]
fn confidence_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(loose_number(deserializer)?.unwrap_or(DEFAULT_CONFIDENCE))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which instruction template and output schema a transcript is classified with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Dashboard command (create project/task, add worktime, order material)
    Dashboard,
    /// Time-entry form prefill
    TimeEntry,
    /// Customer and site extraction with task list
    Advanced,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dashboard => "dashboard",
            Mode::TimeEntry => "time_entry",
            Mode::Advanced => "advanced",
        }
    }
}

/// Customer and site references mentioned in a transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// Action requested by a dashboard voice command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CommandAction {
    CreateProject {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    CreateTask {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Free text, mapped leniently when the task is written
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due_date: Option<String>,
    },
    AddWorktime {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_time: Option<String>,
        #[serde(
            default,
            deserialize_with = "loose_minutes",
            skip_serializing_if = "Option::is_none"
        )]
        break_minutes: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    CreateMaterialOrder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        material_name: Option<String>,
        #[serde(
            default,
            deserialize_with = "loose_number",
            skip_serializing_if = "Option::is_none"
        )]
        quantity: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
}

impl CommandAction {
    /// Bare `create_project` with no fields
    pub fn empty_project() -> Self {
        CommandAction::CreateProject {
            project_name: None,
            description: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CommandAction::CreateProject { .. } => "create_project",
            CommandAction::CreateTask { .. } => "create_task",
            CommandAction::AddWorktime { .. } => "add_worktime",
            CommandAction::CreateMaterialOrder { .. } => "create_material_order",
        }
    }
}

/// Classified dashboard command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardCommand {
    #[serde(flatten)]
    pub action: CommandAction,

    #[serde(flatten)]
    pub entities: EntityRefs,

    #[serde(default = "default_confidence", deserialize_with = "confidence_or_default")]
    pub confidence: f64,
}

/// Classified time-entry form data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryCommand {
    pub activity: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(
        default,
        deserialize_with = "loose_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub break_minutes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default = "default_confidence", deserialize_with = "confidence_or_default")]
    pub confidence: f64,
}

/// Customer, site and task list extracted in advanced mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerExtraction {
    #[serde(flatten)]
    pub entities: EntityRefs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<String>,

    #[serde(default = "default_confidence", deserialize_with = "confidence_or_default")]
    pub confidence: f64,
}

/// Result of classifying a transcript in any mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Classification {
    Dashboard(DashboardCommand),
    TimeEntry(TimeEntryCommand),
    Advanced(CustomerExtraction),
}

impl Classification {
    pub fn mode(&self) -> Mode {
        match self {
            Classification::Dashboard(_) => Mode::Dashboard,
            Classification::TimeEntry(_) => Mode::TimeEntry,
            Classification::Advanced(_) => Mode::Advanced,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Classification::Dashboard(command) => command.confidence,
            Classification::TimeEntry(command) => command.confidence,
            Classification::Advanced(command) => command.confidence,
        }
    }
}
