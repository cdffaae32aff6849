//! Inspect command - Show a template's details.

use anyhow::Result;
use clap::Args;

use super::Context;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Template ID
    #[arg(long)]
    pub id: String,
}

pub async fn execute(args: InspectArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog()?;
    let template = catalog.select_by_id(&args.id)?;
    println!("{}", template.render());
    Ok(())
}
