//! Batch lifecycle operations over a tag selection.
//!
//! Each template runs through the single-template state machine on its own.
//! A failure is recorded and the batch moves on; nothing aborts early.

use std::fmt;

use tracing::{error, info};
use vt_templates::Template;

use crate::error::ProviderError;
use crate::provider::Provider;

/// Lifecycle action applied by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Start,
    Stop,
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// One template that failed within a batch.
#[derive(Debug)]
pub struct BatchFailure {
    pub template_id: String,
    pub error: ProviderError,
}

/// Outcome of a batch, built after every template has been attempted.
#[derive(Debug)]
pub struct BatchReport {
    pub action: BatchAction,
    pub provider: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    fn new(action: BatchAction, provider: &str) -> Self {
        Self {
            action,
            provider: provider.to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.template_id.as_str()).collect()
    }

    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Receives per-template progress from a batch.
pub trait BatchReporter: Send + Sync {
    fn started(&self, _action: BatchAction, _template: &Template) {}

    fn succeeded(&self, _action: BatchAction, _template: &Template) {}

    fn failed(&self, _action: BatchAction, _template: &Template, _error: &ProviderError) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl BatchReporter for NoopReporter {}

/// Start every template, collecting failures.
pub async fn start_batch(
    provider: &dyn Provider,
    templates: &[&Template],
    reporter: &dyn BatchReporter,
) -> BatchReport {
    run_batch(BatchAction::Start, provider, templates, reporter).await
}

/// Stop every template, collecting failures.
pub async fn stop_batch(
    provider: &dyn Provider,
    templates: &[&Template],
    reporter: &dyn BatchReporter,
) -> BatchReport {
    run_batch(BatchAction::Stop, provider, templates, reporter).await
}

async fn run_batch(
    action: BatchAction,
    provider: &dyn Provider,
    templates: &[&Template],
    reporter: &dyn BatchReporter,
) -> BatchReport {
    let mut report = BatchReport::new(action, provider.name());
    info!(
        "Running {} for {} template(s) on {}",
        action,
        templates.len(),
        provider.name()
    );

    for template in templates {
        reporter.started(action, template);
        let result = match action {
            BatchAction::Start => provider.start(template).await,
            BatchAction::Stop => provider.stop(template).await,
        };

        match result {
            Ok(()) => {
                reporter.succeeded(action, template);
                report.succeeded.push(template.id.clone());
            }
            Err(e) => {
                error!("Failed to {} {}: {}", action, template.id, e);
                reporter.failed(action, template, &e);
                report.failed.push(BatchFailure {
                    template_id: template.id.clone(),
                    error: e,
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accessors() {
        let mut report = BatchReport::new(BatchAction::Stop, "docker-compose");
        assert!(report.is_clean());
        report.succeeded.push("a".into());
        report.failed.push(BatchFailure {
            template_id: "b".into(),
            error: ProviderError::NotRunning {
                provider: "docker-compose".into(),
                template: "b".into(),
            },
        });
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failed_ids(), vec!["b"]);
        assert_eq!(report.total(), 2);
        assert!(!report.is_clean());
        assert_eq!(report.action.to_string(), "stop");
    }
}
