//! Batch drivers for the account state machine.
//!
//! Two entry points share the per-record isolation and pacing rules:
//! - **Registration**: validate, claim, run the service workflow, persist
//!   the terminal status ([`AccountLifecycleOrchestrator`])
//! - **Verification**: log in with the fixed credentials and classify the
//!   landing page ([`VerificationOrchestrator`])
//!
//! Both write a JSON summary artifact at the end of every run.

mod runner;
mod types;
mod verifier;

pub use runner::AccountLifecycleOrchestrator;
pub use types::{
    BatchResult, OrchestratorError, OutcomeCounts, RecordOutcome, VerificationCounts,
    VerificationSummary,
};
pub use verifier::VerificationOrchestrator;
