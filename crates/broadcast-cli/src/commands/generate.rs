//! Generate Command - discover listeners and write the provider

use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use broadcast_core::EmitFormat;
use broadcast_pipeline::{rounded_seconds, WriteStatus};

use super::Project;
use crate::output::{self, ConsoleReporter};

/// Execute the generate command
///
/// # Arguments
/// * `project` - Opened project
/// * `dry_run` - Print the rendered provider instead of writing it
/// * `format` - Registry literal format, config value when `None`
pub async fn execute(
    project: &Project,
    dry_run: bool,
    format: Option<EmitFormat>,
) -> Result<ExitCode> {
    let start = Instant::now();
    output::status("Locating listeners");

    let outcome = project.discover(Arc::new(ConsoleReporter::new())).await?;
    let writer = project.writer(format);

    if dry_run {
        let rendered = writer.render(&outcome.registry).await?;
        print!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    match writer.write(&outcome.registry).await? {
        WriteStatus::Written => info!("Provider written to {}", writer.target_path().display()),
        WriteStatus::Unchanged => {
            info!("Provider at {} already up to date", writer.target_path().display())
        }
    }

    output::success(format!(
        "Generated static abstract listeners provider in {} second(s)",
        rounded_seconds(start.elapsed())
    ));
    Ok(ExitCode::SUCCESS)
}
