//! Ps command - List tracked deployments with live status.

use anyhow::Result;
use chrono::Local;
use tracing::warn;

use vt_provider::{DeploymentStatus, ProviderRegistry};
use vt_state::Deployment;
use vt_templates::TemplateCatalog;

use super::Context;

/// One row of the `ps` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsRow {
    pub provider: String,
    pub template: String,
    pub status: DeploymentStatus,
    pub created_at: String,
}

pub async fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let deployments = store.list_all()?;
    if deployments.is_empty() {
        println!("No running environments");
        return Ok(());
    }

    let catalog = ctx.catalog_or_empty();
    let registry = ctx.registry(store).await;
    let rows = collect_rows(deployments, &catalog, &registry).await;
    print_table(&rows);
    Ok(())
}

/// Sorted by provider then template. Unknown providers or templates read as unknown.
pub async fn collect_rows(
    mut deployments: Vec<Deployment>,
    catalog: &TemplateCatalog,
    registry: &ProviderRegistry,
) -> Vec<PsRow> {
    deployments.sort_by(|a, b| {
        a.provider_name
            .cmp(&b.provider_name)
            .then_with(|| a.template_id.cmp(&b.template_id))
    });

    let mut rows = Vec::with_capacity(deployments.len());
    for deployment in deployments {
        let status = match (
            registry.get(&deployment.provider_name),
            catalog.get(&deployment.template_id),
        ) {
            (Some(provider), Some(template)) => provider.status(template).await,
            (None, _) => {
                warn!("Provider {} not registered", deployment.provider_name);
                DeploymentStatus::Unknown
            }
            (_, None) => {
                warn!("Template {} not found", deployment.template_id);
                DeploymentStatus::Unknown
            }
        };

        rows.push(PsRow {
            provider: deployment.provider_name,
            template: deployment.template_id,
            status,
            created_at: deployment
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        });
    }
    rows
}

fn print_table(rows: &[PsRow]) {
    let provider_width = column_width("PROVIDER", rows.iter().map(|r| r.provider.as_str()));
    let template_width = column_width("TEMPLATE", rows.iter().map(|r| r.template.as_str()));

    println!(
        "{:<pw$}  {:<tw$}  {:<8}  CREATED",
        "PROVIDER",
        "TEMPLATE",
        "STATUS",
        pw = provider_width,
        tw = template_width
    );
    for row in rows {
        println!(
            "{:<pw$}  {:<tw$}  {:<8}  {}",
            row.provider,
            row.template,
            row.status.as_str(),
            row.created_at,
            pw = provider_width,
            tw = template_width
        );
    }
}

pub(crate) fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).max().unwrap_or(0).max(header.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use vt_provider::{BackendAction, ManagedProvider, MockBackend, Provider};
    use vt_state::DeploymentStore;
    use vt_templates::Template;

    use super::*;

    fn template(id: &str) -> Template {
        Template {
            id: id.into(),
            ..Default::default()
        }
    }

    fn deployment(provider: &str, template: &str) -> Deployment {
        Deployment {
            provider_name: provider.into(),
            template_id: template.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rows_sorted_with_status() {
        let store = Arc::new(DeploymentStore::in_memory().unwrap());
        let compose = MockBackend::new("docker-compose");
        let flaky = MockBackend::new("docker").fail_on(BackendAction::Inspect, "b", "socket closed");

        let mut registry = ProviderRegistry::new();
        let compose_provider = Arc::new(ManagedProvider::new(compose, Arc::clone(&store)));
        compose_provider.start(&template("a")).await.unwrap();
        registry.register(compose_provider);
        registry.register(Arc::new(ManagedProvider::new(flaky, store)));

        let catalog = TemplateCatalog::from_templates([template("a"), template("b")]);
        let deployments = vec![
            deployment("docker-compose", "b"),
            deployment("docker", "b"),
            deployment("docker-compose", "a"),
            deployment("podman", "a"),
            deployment("docker-compose", "gone"),
        ];

        let rows = collect_rows(deployments, &catalog, &registry).await;
        let keys: Vec<(&str, &str, DeploymentStatus)> = rows
            .iter()
            .map(|r| (r.provider.as_str(), r.template.as_str(), r.status))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("docker", "b", DeploymentStatus::Unknown),
                ("docker-compose", "a", DeploymentStatus::Running),
                ("docker-compose", "b", DeploymentStatus::Unknown),
                ("docker-compose", "gone", DeploymentStatus::Unknown),
                ("podman", "a", DeploymentStatus::Unknown),
            ]
        );
    }

    #[test]
    fn test_column_width() {
        assert_eq!(column_width("ID", ["a", "abcd"].into_iter()), 4);
        assert_eq!(column_width("PROVIDER", std::iter::empty()), 8);
    }
}
