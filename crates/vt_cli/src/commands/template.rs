//! Template command - List or update the local template repository.

use anyhow::{Context as _, Result};
use clap::{ArgGroup, Args};
use tracing::info;

use vt_templates::{parse_tag_list, GitRepository, Template, TemplateError, TemplateFetcher};

use super::ps::column_width;
use super::Context;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("operation").required(true).args(["list", "update"])))]
pub struct TemplateArgs {
    /// List available templates
    #[arg(short, long)]
    pub list: bool,

    /// Fetch or update the template repository
    #[arg(short, long)]
    pub update: bool,

    /// Only list templates matching any of these comma-separated tags
    #[arg(short, long, requires = "list")]
    pub filter: Option<String>,

    /// Discard local edits when updating
    #[arg(long, requires = "update")]
    pub force: bool,
}

pub async fn execute(args: TemplateArgs, ctx: &Context) -> Result<()> {
    if args.update {
        return update(args.force, ctx);
    }
    list(args.filter.as_deref(), ctx)
}

fn update(force: bool, ctx: &Context) -> Result<()> {
    let path = &ctx.config.templates_path;
    info!("Updating templates in {}", path.display());

    GitRepository::default()
        .sync(path, force)
        .context("Failed to update templates")?;

    let catalog = ctx.loader().load_all().context("Updated templates are invalid")?;
    println!("✅ {} template(s) available in {}", catalog.len(), path.display());
    Ok(())
}

fn list(filter: Option<&str>, ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog()?;

    let mut templates = match filter {
        Some(raw) => match catalog.select_by_tags(&parse_tag_list(raw)) {
            Ok(templates) => templates,
            Err(TemplateError::NoMatch(_)) => {
                println!("⚠️  No templates match: {}", raw);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        },
        None => catalog.list(),
    };
    templates.sort_by(|a, b| a.id.cmp(&b.id));

    if templates.is_empty() {
        println!("⚠️  No templates found in {}", catalog.root().display());
        return Ok(());
    }

    print_table(&templates);
    println!();
    println!("{} template(s)", templates.len());
    Ok(())
}

fn print_table(templates: &[&Template]) {
    let rows: Vec<[String; 6]> = templates
        .iter()
        .map(|t| {
            [
                t.id.clone(),
                t.info.name.clone(),
                t.info.author.clone(),
                t.info.targets.join(", "),
                t.info.kind.clone(),
                t.info.tags.join(", "),
            ]
        })
        .collect();

    let headers = ["ID", "NAME", "AUTHOR", "TARGETS", "TYPE", "TAGS"];
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| column_width(header, rows.iter().map(|r| r[i].as_str())))
        .collect();

    print_row(&headers.map(String::from), &widths);
    for row in &rows {
        print_row(row, &widths);
    }
}

fn print_row(cells: &[String; 6], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    println!("{}", line.join("  ").trim_end());
}
