//! Console output for lifecycle progress.

use vt_provider::{BatchAction, BatchReport, BatchReporter, ProviderError};
use vt_templates::Template;

/// Prints per-template progress and post-install instructions to stdout.
pub struct ConsoleReporter {
    provider: String,
}

impl ConsoleReporter {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    pub fn summary(&self, report: &BatchReport) {
        println!();
        println!(
            "Results: {} succeeded, {} failed",
            report.success_count(),
            report.failed.len()
        );
        for failure in &report.failed {
            println!("   - {}: {}", failure.template_id, failure.error);
        }
    }
}

impl BatchReporter for ConsoleReporter {
    fn started(&self, action: BatchAction, template: &Template) {
        let verb = match action {
            BatchAction::Start => "Starting",
            BatchAction::Stop => "Stopping",
        };
        println!("🚀 {} {} on {}...", verb, template.id, self.provider);
    }

    fn succeeded(&self, action: BatchAction, template: &Template) {
        match action {
            BatchAction::Start => {
                if !template.post_install.is_empty() {
                    println!("📋 Post-installation instructions for {}:", template.id);
                    for instruction in &template.post_install {
                        println!("   {}", instruction);
                    }
                }
                println!("✅ {} is running on {}", template.id, self.provider);
            }
            BatchAction::Stop => {
                println!("✅ {} stopped on {}", template.id, self.provider);
            }
        }
    }

    fn failed(&self, action: BatchAction, template: &Template, error: &ProviderError) {
        println!("❌ Failed to {} {}: {}", action, template.id, error);
        if error.is_inconsistent() {
            println!("⚠️  Deployment state no longer matches the environment; reconcile manually");
        }
    }
}
