//! Registration workflows: the per-service trait, the registry and the
//! service-agnostic runner that executes one workflow per record inside
//! a fresh browser session.

mod prepared;
mod registry;
mod runner;
mod types;

pub use prepared::{PreparedAccount, FALLBACK_PHONE};
pub use registry::WorkflowRegistry;
pub use runner::WorkflowRunner;
pub use types::{Workflow, WorkflowError, WorkflowOutcome};
