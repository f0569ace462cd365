//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrators (registration and verification outcomes)
//! - Workflow runs against target services
//! - Captcha solving
//! - Verification-code retrieval

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Registration outcomes total by service and terminal status.
pub static REGISTRATION_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "enroller_registration_outcomes_total",
            "Total registration record outcomes",
        ),
        &["service", "status"], // status: "pending", "error", "incomplete", "fatal_error"
    )
    .unwrap()
});

/// Verification outcomes total by service and classification.
pub static VERIFICATION_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "enroller_verification_outcomes_total",
            "Total verification record outcomes",
        ),
        &["service", "status"], // status: "verified", "soon", "rejected", "error"
    )
    .unwrap()
});

// =============================================================================
// Workflow Metrics
// =============================================================================

/// Workflow runs total by service and result.
pub static WORKFLOW_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("enroller_workflow_runs_total", "Total workflow runs"),
        &["service", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Workflow run duration in seconds, session acquisition included.
pub static WORKFLOW_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "enroller_workflow_duration_seconds",
            "Duration of workflow runs",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["service"],
    )
    .unwrap()
});

// =============================================================================
// Mailbox Metrics
// =============================================================================

/// Mailbox queries spent on verification-code retrievals, by result.
pub static OTP_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "enroller_otp_attempts_total",
            "Total mailbox queries for verification codes",
        ),
        &["result"], // "found", "not_found"
    )
    .unwrap()
});

// =============================================================================
// Captcha Metrics
// =============================================================================

/// Captcha solve duration in seconds.
pub static CAPTCHA_SOLVE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "enroller_captcha_solve_duration_seconds",
            "Duration of captcha solves",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"], // "solved", "timeout", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REGISTRATION_OUTCOMES.clone()),
        Box::new(VERIFICATION_OUTCOMES.clone()),
        Box::new(WORKFLOW_RUNS.clone()),
        Box::new(WORKFLOW_DURATION.clone()),
        Box::new(OTP_ATTEMPTS.clone()),
        Box::new(CAPTCHA_SOLVE_DURATION.clone()),
    ]
}
