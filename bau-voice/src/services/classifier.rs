//! Transcript classifier
//!
//! Turns a raw transcript into a confidence-scored command by asking the NLU
//! service for JSON in a mode-specific shape.
//!
//! **Failure policy:** never returns an error. Unreachable service, missing
//! credential, bad status or unparseable reply all yield the mode's fallback
//! command, whose low confidence tells the caller not to trust it.

use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

use crate::models::{
    Classification, CommandAction, CustomerExtraction, DashboardCommand, EntityRefs, Mode,
    TimeEntryCommand,
};
use crate::services::nlu_client::{CompletionClient, NluError, Prompt};

/// Confidence of the dashboard fallback
pub const DASHBOARD_FALLBACK_CONFIDENCE: f64 = 0.3;

/// Confidence of the time-entry fallback
pub const TIME_ENTRY_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Confidence of the advanced-mode fallback
pub const ADVANCED_FALLBACK_CONFIDENCE: f64 = 0.3;

/// Activity used when no time-entry classification is available
pub const FALLBACK_ACTIVITY: &str = "Allgemeine Arbeiten";

/// Output schema of one classification mode
pub trait CommandSchema: DeserializeOwned + Sized {
    const MODE: Mode;

    /// Instruction text sent ahead of the example
    fn instructions() -> &'static str;

    /// Literal example of the expected JSON reply
    fn example() -> serde_json::Value;

    /// Result used when no valid reply is available
    fn fallback(transcript: &str) -> Self;

    fn confidence_mut(&mut self) -> &mut f64;
}

impl CommandSchema for DashboardCommand {
    const MODE: Mode = Mode::Dashboard;

    fn instructions() -> &'static str {
        "Du bist ein Assistent für die Verwaltung von Baustellen. Ordne den folgenden \
         Sprachbefehl genau einer Aktion zu: \"create_project\" (neue Baustelle oder neues \
         Projekt), \"create_task\" (Aufgabe anlegen), \"add_worktime\" (Arbeitszeit erfassen) \
         oder \"create_material_order\" (Material bestellen). Übernimm Kundenname, Straße, \
         Postleitzahl und Ort, falls genannt. Lass unbekannte Felder weg. Gib in \
         \"confidence\" an, wie sicher du dir bist (0 bis 1)."
    }

    fn example() -> serde_json::Value {
        json!({
            "type": "create_project",
            "projectName": "Neubau Einfamilienhaus",
            "customerName": "Müller",
            "street": "Hauptstraße 5",
            "zipCode": "20095",
            "city": "Hamburg",
            "title": "nur bei create_task",
            "priority": "low | medium | high",
            "startTime": "07:00",
            "endTime": "16:00",
            "breakMinutes": 30,
            "materialName": "Zement",
            "quantity": 5,
            "unit": "Sack",
            "confidence": 0.9
        })
    }

    fn fallback(_transcript: &str) -> Self {
        DashboardCommand {
            action: CommandAction::empty_project(),
            entities: EntityRefs::default(),
            confidence: DASHBOARD_FALLBACK_CONFIDENCE,
        }
    }

    fn confidence_mut(&mut self) -> &mut f64 {
        &mut self.confidence
    }
}

impl CommandSchema for TimeEntryCommand {
    const MODE: Mode = Mode::TimeEntry;

    fn instructions() -> &'static str {
        "Du hilfst beim Erfassen von Arbeitszeiten auf Baustellen. Extrahiere aus dem \
         folgenden Sprachbefehl die Tätigkeit, Beginn und Ende (HH:MM), die Pause in Minuten \
         und sonstige Notizen. Lass unbekannte Felder weg. Gib in \"confidence\" an, wie \
         sicher du dir bist (0 bis 1)."
    }

    fn example() -> serde_json::Value {
        json!({
            "activity": "Trockenbau",
            "startTime": "07:30",
            "endTime": "16:00",
            "breakMinutes": 30,
            "notes": "Wände im Erdgeschoss gespachtelt",
            "confidence": 0.9
        })
    }

    fn fallback(transcript: &str) -> Self {
        TimeEntryCommand {
            activity: FALLBACK_ACTIVITY.to_string(),
            start_time: None,
            end_time: None,
            break_minutes: None,
            notes: Some(transcript.to_string()),
            confidence: TIME_ENTRY_FALLBACK_CONFIDENCE,
        }
    }

    fn confidence_mut(&mut self) -> &mut f64 {
        &mut self.confidence
    }
}

impl CommandSchema for CustomerExtraction {
    const MODE: Mode = Mode::Advanced;

    fn instructions() -> &'static str {
        "Du bist ein Assistent für Handwerksbetriebe. Extrahiere aus dem folgenden \
         Sprachbefehl den Kunden (Name, Straße mit Hausnummer, Postleitzahl, Ort), einen \
         Projektnamen, eine kurze Beschreibung und die genannten Aufgaben als Liste. Lass \
         unbekannte Felder weg. Gib in \"confidence\" an, wie sicher du dir bist (0 bis 1)."
    }

    fn example() -> serde_json::Value {
        json!({
            "customerName": "Müller",
            "street": "Hauptstraße 5",
            "zipCode": "20095",
            "city": "Hamburg",
            "projectName": "Badsanierung",
            "description": "Komplettsanierung des Badezimmers im Obergeschoss",
            "tasks": ["Alte Fliesen entfernen", "Estrich prüfen"],
            "confidence": 0.85
        })
    }

    fn fallback(transcript: &str) -> Self {
        CustomerExtraction {
            entities: EntityRefs::default(),
            project_name: None,
            description: Some(transcript.to_string()),
            tasks: Vec::new(),
            confidence: ADVANCED_FALLBACK_CONFIDENCE,
        }
    }

    fn confidence_mut(&mut self) -> &mut f64 {
        &mut self.confidence
    }
}

/// Transcript classifier
#[derive(Clone)]
pub struct Classifier {
    client: Arc<dyn CompletionClient>,
}

impl Classifier {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Classify `transcript` with the template and schema selected by `mode`
    pub async fn classify(&self, transcript: &str, mode: Mode) -> Classification {
        match mode {
            Mode::Dashboard => Classification::Dashboard(self.classify_as(transcript).await),
            Mode::TimeEntry => Classification::TimeEntry(self.classify_as(transcript).await),
            Mode::Advanced => Classification::Advanced(self.classify_as(transcript).await),
        }
    }

    /// Classify into a concrete schema, falling back on any failure
    pub async fn classify_as<T: CommandSchema>(&self, transcript: &str) -> T {
        let prompt = Prompt {
            instructions: T::instructions().to_string(),
            example_schema: T::example(),
            transcript: transcript.to_string(),
        };

        let reply = match self.client.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    mode = T::MODE.as_str(),
                    provider = self.client.name(),
                    error = %e,
                    "NLU request failed, using fallback command"
                );
                return T::fallback(transcript);
            }
        };

        match parse_reply::<T>(&reply) {
            Ok(mut command) => {
                let confidence = command.confidence_mut();
                *confidence = clamp_confidence(*confidence);
                tracing::debug!(
                    mode = T::MODE.as_str(),
                    confidence = *confidence,
                    "Transcript classified"
                );
                command
            }
            Err(e) => {
                tracing::warn!(
                    mode = T::MODE.as_str(),
                    error = %e,
                    "Unparseable NLU reply, using fallback command"
                );
                T::fallback(transcript)
            }
        }
    }
}

/// Parse the JSON object embedded in a model reply
///
/// Models wrap JSON in code fences or prose; the outermost `{ ... }` is taken.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T, NluError> {
    let start = reply
        .find('{')
        .ok_or_else(|| NluError::ParseError("Reply contains no JSON object".to_string()))?;
    let end = reply
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| NluError::ParseError("Reply contains no JSON object".to_string()))?;

    serde_json::from_str(&reply[start..=end]).map_err(|e| NluError::ParseError(e.to_string()))
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
