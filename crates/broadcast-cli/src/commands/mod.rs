//! Command implementations
//!
//! Every command opens the [`Project`] first: configuration, CLI overrides
//! and the composer manifests. Discovery and artifact paths derive from it.

pub mod check;
pub mod generate;
pub mod list;

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

use broadcast_config::{BroadcastConfig, ManifestPathResolver};
use broadcast_core::{DiscoveryReporter, EmitFormat, RegistryEmitter};
use broadcast_parser::{DirectoryClassEnumerator, SourceReflector};
use broadcast_pipeline::{
    bootstrap_locator, ArtifactWriter, DiscoveryOutcome, DiscoveryPipeline,
    DiscoveryPipelineConfig,
};

use crate::cli::{Cli, Commands};

/// Dispatch the parsed command line
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    let project = Project::open(&cli).await?;

    match cli.command {
        Some(Commands::Generate { dry_run, format }) => {
            generate::execute(&project, dry_run, format).await
        }
        Some(Commands::List { format }) => list::execute(&project, format).await,
        Some(Commands::Check) => check::execute(&project).await,
        None => generate::execute(&project, false, None).await,
    }
}

/// A project on disk with its effective configuration
pub struct Project {
    config: BroadcastConfig,
    resolver: Arc<ManifestPathResolver>,
}

impl Project {
    /// Load configuration, apply CLI overrides and read the manifests
    pub async fn open(cli: &Cli) -> Result<Self> {
        let root = cli.project.as_path();
        let mut config = BroadcastConfig::load(cli.config.as_deref(), root)?;

        if let Some(concurrency) = cli.concurrency {
            config.discovery.concurrency = concurrency;
        }
        if let Some(marker) = &cli.marker {
            config.discovery.marker_interface = marker.clone();
        }
        config.validate()?;

        let resolver =
            ManifestPathResolver::load(root, &config.discovery.listener_flag)
                .await
                .with_context(|| format!("Failed to read manifests in {}", root.display()))?;
        debug!(package = resolver.root_package_name(), "Opened project {}", root.display());

        Ok(Self {
            config,
            resolver: Arc::new(resolver),
        })
    }

    /// Build the collaborators and run discovery
    pub async fn discover(
        &self,
        reporter: Arc<dyn DiscoveryReporter>,
    ) -> Result<DiscoveryOutcome> {
        let locator = bootstrap_locator(
            self.resolver.autoload_map(),
            self.config.bootstrap.max_retries,
        )
        .await?;

        let pipeline = DiscoveryPipeline::with_config(
            self.resolver.clone(),
            Arc::new(DirectoryClassEnumerator::new()),
            Arc::new(SourceReflector::new(locator)),
            DiscoveryPipelineConfig {
                concurrency: self.config.discovery.concurrency,
                marker_interface: self.config.discovery.marker_interface.clone(),
            },
        )
        .with_reporter(reporter);

        Ok(pipeline.run().await?)
    }

    /// Writer for the provider, paths resolved against the install path
    pub fn writer(&self, format: Option<EmitFormat>) -> ArtifactWriter {
        let output = &self.config.output;
        let install_path = self.resolver.install_path(&output.package_name);
        let emitter = RegistryEmitter::new(format.unwrap_or(output.format));

        ArtifactWriter::new(
            install_path.join(&output.template),
            install_path.join(&output.target),
            emitter,
        )
        .with_file_mode(output.file_mode)
    }
}
