//! Voice command pipeline
//!
//! Per request: classify → resolve customer → resolve project → materialize.
//! Every stage recovers locally, so the pipeline always produces a result.

use std::sync::Arc;
use tracing::info;

use crate::db::Store;
use crate::models::{
    CustomerExtraction, DashboardCommand, EntityRefs, Resolution, ResolutionReport, ResultSummary,
    TimeEntryCommand,
};
use crate::services::{Classifier, CompletionClient, EntityResolver, Materializer};

/// Classifier, resolver and materializer sharing one store
#[derive(Clone)]
pub struct VoicePipeline {
    nlu: Arc<dyn CompletionClient>,
    classifier: Classifier,
    resolver: EntityResolver,
    materializer: Materializer,
}

impl VoicePipeline {
    pub fn new(nlu: Arc<dyn CompletionClient>, store: Arc<dyn Store>) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&nlu)),
            resolver: EntityResolver::new(Arc::clone(&store)),
            materializer: Materializer::new(store),
            nlu,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Whether the NLU client currently holds a credential
    pub async fn nlu_configured(&self) -> bool {
        self.nlu.is_configured().await
    }

    /// Dashboard mode: classify, resolve, then write the implied record
    pub async fn run_dashboard(&self, transcript: &str) -> ResultSummary<DashboardCommand> {
        let command: DashboardCommand = self.classifier.classify_as(transcript).await;
        let resolution = self.resolve_entities(&command.entities).await;

        let writes = self
            .materializer
            .materialize(&command, resolution.customer.id(), resolution.project.id())
            .await;

        info!(
            action = command.action.type_name(),
            confidence = command.confidence,
            customer_id = ?resolution.customer.id(),
            project_id = ?resolution.project.id(),
            writes = writes.len(),
            "Dashboard command processed"
        );

        ResultSummary::new(command, resolution, writes)
    }

    /// Time-entry mode: classification only, the client fills its form with it
    pub async fn analyze_time_entry(&self, transcript: &str) -> TimeEntryCommand {
        let command: TimeEntryCommand = self.classifier.classify_as(transcript).await;

        info!(
            activity = %command.activity,
            confidence = command.confidence,
            "Time entry analyzed"
        );

        command
    }

    /// Advanced mode: resolve customer and site, then create the listed tasks
    pub async fn run_advanced(&self, transcript: &str) -> ResultSummary<CustomerExtraction> {
        let extraction: CustomerExtraction = self.classifier.classify_as(transcript).await;
        let resolution = self.resolve_entities(&extraction.entities).await;

        let writes = self
            .materializer
            .create_tasks(&extraction.tasks, resolution.project.id())
            .await;

        info!(
            confidence = extraction.confidence,
            customer_id = ?resolution.customer.id(),
            project_id = ?resolution.project.id(),
            tasks = writes.len(),
            "Advanced command processed"
        );

        ResultSummary::new(extraction, resolution, writes)
    }

    /// Resolve the customer, then its project when the customer has an id
    async fn resolve_entities(&self, refs: &EntityRefs) -> ResolutionReport {
        let customer = self.resolver.resolve_customer(refs).await;

        let project = match customer.id() {
            Some(customer_id) => {
                let customer_name = refs.customer_name.as_deref().unwrap_or_default();
                self.resolver
                    .resolve_project(customer_id, customer_name, refs)
                    .await
            }
            None => Resolution::skipped("no customer"),
        };

        ResolutionReport { customer, project }
    }
}
