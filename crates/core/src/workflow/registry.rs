use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::types::Workflow;

/// Registered workflows, keyed by service name.
///
/// Adding support for a new target service means implementing
/// [`Workflow`] and registering it here; nothing in the orchestration
/// layer changes.
#[derive(Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, Arc<dyn Workflow>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow under its service name. A second registration
    /// for the same service replaces the first.
    pub fn register(&mut self, workflow: Arc<dyn Workflow>) {
        let service = workflow.service().to_string();
        if self.workflows.insert(service.clone(), workflow).is_some() {
            warn!(service = %service, "Workflow replaced an existing registration");
        }
    }

    pub fn get(&self, service: &str) -> Option<Arc<dyn Workflow>> {
        self.workflows.get(service).cloned()
    }

    /// Known service names, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut services: Vec<String> = self.workflows.keys().cloned().collect();
        services.sort();
        services
    }
}
