//! Self-healing class locator construction
//!
//! A PSR-4 prefix pointing at a directory that does not exist yet (generated
//! code, fresh checkouts) makes locator construction fail. The directory is
//! created and construction retried, within a retry budget.

use std::path::PathBuf;

use tracing::{info, warn};

use broadcast_core::AutoloadMap;
use broadcast_parser::{ComposerLocator, LocatorError};

use crate::error::PipelineError;

/// Call `build` until it succeeds, creating each reported missing directory
///
/// Fails with [`PipelineError::Bootstrap`] when the same directory is
/// reported twice or more than `max_retries` directories had to be created.
/// Other locator errors are returned unchanged.
pub fn bootstrap<T, F>(mut build: F, max_retries: usize) -> Result<T, PipelineError>
where
    F: FnMut() -> Result<T, LocatorError>,
{
    let mut created: Vec<PathBuf> = Vec::new();

    loop {
        match build() {
            Ok(value) => return Ok(value),
            Err(LocatorError::MissingDirectory { prefix, path }) => {
                if created.contains(&path) {
                    return Err(PipelineError::Bootstrap {
                        message: format!(
                            "directory \"{}\" for prefix \"{}\" is still missing after creating it",
                            path.display(),
                            prefix
                        ),
                    });
                }
                if created.len() >= max_retries {
                    warn!("Retry budget of {} exhausted", max_retries);
                    return Err(PipelineError::Bootstrap {
                        message: format!(
                            "gave up after {} retries, directory \"{}\" for prefix \"{}\" is missing",
                            max_retries,
                            path.display(),
                            prefix
                        ),
                    });
                }

                info!("Creating missing autoload directory {}", path.display());
                std::fs::create_dir_all(&path).map_err(|e| PipelineError::io(&path, e))?;
                created.push(path);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Build a [`ComposerLocator`] for `map` on the blocking pool, healing missing directories
pub async fn bootstrap_locator(
    map: AutoloadMap,
    max_retries: usize,
) -> Result<ComposerLocator, PipelineError> {
    tokio::task::spawn_blocking(move || bootstrap(|| ComposerLocator::build(&map), max_retries))
        .await
        .map_err(PipelineError::from_join)?
}
