//! Generated artifact writer
//!
//! Embeds a registry into the provider template and replaces the target file
//! atomically: the content goes to a temporary file next to the target and
//! is renamed over it, so readers never observe a partial write.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use broadcast_core::{EventRegistry, RegistryEmitter, Template};

use crate::error::PipelineError;

/// Result of [`ArtifactWriter::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The target was created or replaced
    Written,
    /// The target already held identical content
    Unchanged,
}

/// Renders and persists the generated provider
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    template_path: PathBuf,
    target_path: PathBuf,
    emitter: RegistryEmitter,
    file_mode: Option<u32>,
}

impl ArtifactWriter {
    pub fn new(
        template_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
        emitter: RegistryEmitter,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            target_path: target_path.into(),
            emitter,
            file_mode: None,
        }
    }

    /// Permissions applied to the target after each write (unix only)
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub async fn load_template(&self) -> Result<Template, PipelineError> {
        let text = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|e| PipelineError::io(&self.template_path, e))?;
        Ok(Template::parse(text)?)
    }

    /// Final artifact content for `registry`
    pub async fn render(&self, registry: &EventRegistry) -> Result<String, PipelineError> {
        let template = self.load_template().await?;
        Ok(self.emitter.render(&template, registry)?)
    }

    /// Whether the target exists and holds exactly `rendered`
    pub async fn is_current(&self, rendered: &str) -> bool {
        match tokio::fs::read(&self.target_path).await {
            Ok(existing) => existing == rendered.as_bytes(),
            Err(_) => false,
        }
    }

    /// Render `registry` and persist it over the target
    pub async fn write(&self, registry: &EventRegistry) -> Result<WriteStatus, PipelineError> {
        let rendered = self.render(registry).await?;
        self.write_rendered(rendered).await
    }

    /// Persist already rendered content over the target
    pub async fn write_rendered(&self, rendered: String) -> Result<WriteStatus, PipelineError> {
        if self.is_current(&rendered).await {
            debug!("{} is up to date", self.target_path.display());
            self.apply_mode().await?;
            return Ok(WriteStatus::Unchanged);
        }

        let target = self.target_path.clone();
        let mode = self.file_mode;
        tokio::task::spawn_blocking(move || persist_atomically(&target, rendered.as_bytes(), mode))
            .await
            .map_err(PipelineError::from_join)??;

        info!("Wrote {}", self.target_path.display());
        Ok(WriteStatus::Written)
    }

    async fn apply_mode(&self) -> Result<(), PipelineError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = self.file_mode {
                let permissions = std::fs::Permissions::from_mode(mode);
                tokio::fs::set_permissions(&self.target_path, permissions)
                    .await
                    .map_err(|e| PipelineError::io(&self.target_path, e))?;
            }
        }
        Ok(())
    }
}

fn persist_atomically(target: &Path, contents: &[u8], mode: Option<u32>) -> Result<(), PipelineError> {
    let directory = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory).map_err(|e| PipelineError::io(&directory, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(&directory)
        .map_err(|e| PipelineError::io(&directory, e))?;
    temp.write_all(contents)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| PipelineError::io(temp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(mode))
                .map_err(|e| PipelineError::io(temp.path(), e))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    temp.persist(target)
        .map_err(|e| PipelineError::io(target, e.error))?;
    Ok(())
}
