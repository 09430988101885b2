//! Check Command - compare the provider on disk with a fresh render

use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;

use super::Project;
use crate::output::{self, ConsoleReporter};

pub async fn execute(project: &Project) -> Result<ExitCode> {
    let outcome = project.discover(Arc::new(ConsoleReporter::new())).await?;
    let writer = project.writer(None);
    let rendered = writer.render(&outcome.registry).await?;

    if writer.is_current(&rendered).await {
        output::success(format!("{} is up to date", writer.target_path().display()));
        Ok(ExitCode::SUCCESS)
    } else {
        output::error(format!(
            "{} is out of date, run `bcast generate`",
            writer.target_path().display()
        ));
        Ok(ExitCode::FAILURE)
    }
}
