//! Start and stop commands.

use anyhow::Result;
use clap::Args;
use tracing::info;

use vt_provider::{start_batch, stop_batch, BatchAction, BatchReporter, ProviderRegistry};
use vt_templates::{parse_tag_list, TemplateCatalog};

use super::report::ConsoleReporter;
use super::{BatchFailed, Context, TargetArgs};

#[derive(Args, Debug)]
pub struct LifecycleArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Provider to run on (defaults to the configured provider)
    #[arg(short, long)]
    pub provider: Option<String>,
}

pub async fn execute(action: BatchAction, args: LifecycleArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog()?;
    let store = ctx.open_store()?;
    let registry = ctx.registry(store).await;
    run(action, &args, ctx, &catalog, &registry).await
}

async fn run(
    action: BatchAction,
    args: &LifecycleArgs,
    ctx: &Context,
    catalog: &TemplateCatalog,
    registry: &ProviderRegistry,
) -> Result<()> {
    let provider_name = ctx.provider_name(args.provider.as_deref());
    let provider = registry.get_required(provider_name)?;
    let reporter = ConsoleReporter::new(provider_name);

    if let Some(id) = &args.target.id {
        let template = catalog.select_by_id(id)?;
        reporter.started(action, template);
        let result = match action {
            BatchAction::Start => provider.start(template).await,
            BatchAction::Stop => provider.stop(template).await,
        };
        if let Err(e) = &result {
            reporter.failed(action, template, e);
        }
        result?;
        reporter.succeeded(action, template);
        return Ok(());
    }

    let raw = args.target.tags.as_deref().unwrap_or_default();
    let templates = catalog.select_by_tags(&parse_tag_list(raw))?;
    info!("Found {} template(s) matching tags: {}", templates.len(), raw);

    let report = match action {
        BatchAction::Start => start_batch(provider.as_ref(), &templates, &reporter).await,
        BatchAction::Stop => stop_batch(provider.as_ref(), &templates, &reporter).await,
    };
    reporter.summary(&report);

    if report.is_clean() {
        Ok(())
    } else {
        Err(BatchFailed::from(&report).into())
    }
}
