//! Docker Engine backend using the Docker API.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::image::{BuildImageOptions, CreateImageOptions};
use bollard::service::{HostConfig, PortBinding};
use bollard::Docker;
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use vt_templates::{ProviderConfig, Template};

use crate::backend::Backend;
use crate::error::{ProviderError, ProviderResult};

/// Provider name for the Docker backend.
pub const DOCKER_PROVIDER: &str = "docker";

type ExposedPorts = HashMap<String, HashMap<(), ()>>;
type PortBindings = HashMap<String, Option<Vec<PortBinding>>>;

/// Name of the container backing a template.
pub fn container_name(template_id: &str) -> String {
    format!("vt-{}", template_id)
}

/// Tag of the image built from inline Dockerfile content.
pub fn image_name(template_id: &str) -> String {
    format!("vt-image-{}", template_id)
}

/// Backend running each template as a single container.
pub struct DockerBackend {
    client: Docker,
}

impl DockerBackend {
    /// Connect to the local Docker daemon.
    pub async fn connect() -> ProviderResult<Self> {
        let client = Docker::connect_with_local_defaults()?;

        // Verify connection
        client.ping().await?;

        Ok(Self { client })
    }

    fn config<'a>(&self, template: &'a Template) -> ProviderResult<&'a ProviderConfig> {
        template
            .provider(DOCKER_PROVIDER)
            .ok_or_else(|| missing_config(template))
    }

    async fn ensure_image(&self, reference: &str) -> ProviderResult<()> {
        match self.client.inspect_image(reference).await {
            Ok(_) => {
                debug!("Image {} present locally", reference);
                return Ok(());
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => return Err(e.into()),
        }

        info!("Pulling image {}", reference);
        let (image, tag) = split_image_reference(reference);
        let options = CreateImageOptions {
            from_image: image,
            tag,
            ..Default::default()
        };

        let mut stream = self.client.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            let info = result?;
            if let Some(status) = info.status {
                debug!("Pull status: {}", status);
            }
        }

        info!("Image {} pulled successfully", reference);
        Ok(())
    }

    async fn build_image(&self, template: &Template, dockerfile: &str) -> ProviderResult<String> {
        let tag = image_name(&template.id);
        info!("Building image {}", tag);

        let options = BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag.as_str(),
            rm: true,
            ..Default::default()
        };
        let context = build_context(dockerfile)?;

        let mut stream = self.client.build_image(options, None, Some(context.into()));
        while let Some(result) = stream.next().await {
            let info = result?;
            if let Some(line) = info.stream {
                debug!("Build: {}", line.trim());
            }
            if let Some(error) = info.error {
                return Err(ProviderError::Backend {
                    provider: DOCKER_PROVIDER.to_string(),
                    template: template.id.clone(),
                    message: error,
                });
            }
        }

        Ok(tag)
    }

    /// Resolve the image to run: a pulled reference, inline content or a Dockerfile on disk.
    async fn prepare_image(&self, template: &Template) -> ProviderResult<String> {
        let config = self.config(template)?;

        if let Some(reference) = config.image() {
            self.ensure_image(reference).await?;
            return Ok(reference.to_string());
        }
        if let Some(dockerfile) = config.dockerfile() {
            return self.build_image(template, dockerfile).await;
        }
        if let Some(path) = config.resolve_path(&template.path) {
            let dockerfile = tokio::fs::read_to_string(&path).await?;
            return self.build_image(template, &dockerfile).await;
        }
        Err(missing_config(template))
    }

    async fn remove_container(&self, name: &str) -> ProviderResult<()> {
        match self
            .client
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Backend for DockerBackend {
    fn name(&self) -> &str {
        DOCKER_PROVIDER
    }

    async fn up(&self, template: &Template) -> ProviderResult<()> {
        let image = self.prepare_image(template).await?;
        let config = self.config(template)?;
        let (exposed_ports, port_bindings) = port_mappings(&config.ports);
        let name = container_name(&template.id);

        // A leftover container from an earlier run would block the name.
        self.remove_container(&name).await?;

        let container_config = Config {
            image: Some(image.clone()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .client
            .create_container(
                Some(CreateContainerOptions {
                    name: name.as_str(),
                    platform: None,
                }),
                container_config,
            )
            .await?;
        for warning in &created.warnings {
            warn!("{}", warning);
        }

        self.client
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await?;

        info!("Container {} started from {}", name, image);
        Ok(())
    }

    async fn down(&self, template: &Template) -> ProviderResult<()> {
        let name = container_name(&template.id);
        match self.client.stop_container(&name, None).await {
            Ok(()) => {}
            // 304: already stopped
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => {}
            Err(e) => return Err(e.into()),
        }
        self.remove_container(&name).await
    }

    async fn inspect(&self, template: &Template) -> ProviderResult<bool> {
        let name = container_name(&template.id);
        match self
            .client
            .inspect_container(&name, None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => Ok(details
                .state
                .and_then(|state| state.running)
                .unwrap_or(false)),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn missing_config(template: &Template) -> ProviderError {
    ProviderError::MissingConfig {
        provider: DOCKER_PROVIDER.to_string(),
        template: template.id.clone(),
    }
}

/// Split `name[:tag]` into image and tag, leaving registry ports and digests intact.
fn split_image_reference(reference: &str) -> (&str, &str) {
    if reference.contains('@') {
        return (reference, "");
    }
    match reference.rsplit_once(':') {
        Some((image, tag)) if !tag.contains('/') => (image, tag),
        _ => (reference, "latest"),
    }
}

/// Translate `"80/tcp" -> "8080"` entries into Docker port maps.
///
/// Entries with an unparsable port or protocol are skipped with a warning.
fn port_mappings(ports: &HashMap<String, String>) -> (ExposedPorts, PortBindings) {
    let mut exposed = HashMap::new();
    let mut bindings = HashMap::new();

    for (container, host) in ports {
        let (port, proto) = container.split_once('/').unwrap_or((container.as_str(), "tcp"));
        let valid_proto = matches!(proto, "tcp" | "udp" | "sctp");
        if port.parse::<u16>().is_err() || !valid_proto || host.parse::<u16>().is_err() {
            warn!("Ignoring invalid port mapping {} -> {}", container, host);
            continue;
        }

        let key = format!("{}/{}", port, proto);
        exposed.insert(key.clone(), HashMap::new());
        bindings.insert(
            key,
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(host.clone()),
            }]),
        );
    }

    (exposed, bindings)
}

/// Build a tar archive holding only the Dockerfile.
fn build_context(dockerfile: &str) -> ProviderResult<Vec<u8>> {
    let mut archive = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(dockerfile.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    archive.append_data(&mut header, "Dockerfile", dockerfile.as_bytes())?;
    Ok(archive.into_inner()?)
}
