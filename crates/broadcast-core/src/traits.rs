//! Collaborator abstractions
//!
//! The discovery pipeline only depends on these traits. Concrete implementations
//! live in `broadcast-config` (path resolution) and `broadcast-parser`
//! (enumeration and reflection); tests substitute in-memory mocks.
//!
//! ## Usage Pattern
//!
//! ```rust,ignore
//! let directories = resolver.list_source_directories().await?;
//! let classes = enumerator.enumerate(&directories).await?;
//! for class in &classes {
//!     match reflector.reflect(class).await {
//!         Ok(metadata) => { /* filter */ }
//!         Err(e) if e.is_recoverable() => { /* report and skip */ }
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{EnumerationError, ReflectionError, ResolveError};
use crate::types::{ClassIdentifier, ClassMetadata, SourceDirectory};

/// Yields the directories to scan
///
/// Implementations return only existing directories, without duplicates.
#[async_trait]
pub trait PathResolver: Send + Sync {
    async fn list_source_directories(&self) -> Result<Vec<SourceDirectory>, ResolveError>;
}

/// Turns directories into class identifiers
///
/// The returned order is the order handlers are folded into the registry, so
/// implementations must produce it deterministically for an unchanged filesystem.
#[async_trait]
pub trait ClassEnumerator: Send + Sync {
    async fn enumerate(
        &self,
        directories: &[SourceDirectory],
    ) -> Result<Vec<ClassIdentifier>, EnumerationError>;
}

/// Structural reflection of a single class
///
/// # Errors
///
/// - [`ReflectionError::NotFound`] when the identifier cannot be resolved (recoverable)
/// - [`ReflectionError::Fatal`] when the input has an unexpected shape
#[async_trait]
pub trait Reflector: Send + Sync {
    async fn reflect(&self, class: &ClassIdentifier) -> Result<ClassMetadata, ReflectionError>;
}

/// Counters describing one finished discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Source directories scanned
    pub directories: usize,
    /// Class identifiers enumerated
    pub classes: usize,
    /// Classes dropped because reflection could not resolve them
    pub skipped: usize,
    /// Handler descriptors folded into the registry
    pub listeners: usize,
    /// Distinct event types in the registry
    pub events: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Progress reporter for discovery runs
///
/// Receives the user-visible progress of a run. Diagnostic logging goes
/// through `tracing` independently of this trait.
#[async_trait]
pub trait DiscoveryReporter: Send + Sync {
    /// Report that source directories were resolved
    async fn directories_resolved(&self, directories: &[SourceDirectory]);

    /// Report a class dropped because of a recoverable reflection failure
    async fn class_skipped(&self, class: &ClassIdentifier, error: &ReflectionError);

    /// Report that the run completed
    async fn completed(&self, stats: &DiscoveryStats);
}

/// Default no-op progress reporter
pub struct NoOpReporter;

#[async_trait]
impl DiscoveryReporter for NoOpReporter {
    async fn directories_resolved(&self, _directories: &[SourceDirectory]) {
        // No-op implementation
    }

    async fn class_skipped(&self, _class: &ClassIdentifier, _error: &ReflectionError) {
        // No-op implementation
    }

    async fn completed(&self, _stats: &DiscoveryStats) {
        // No-op implementation
    }
}

/// Reporter forwarding progress to `tracing`
pub struct TracingReporter;

#[async_trait]
impl DiscoveryReporter for TracingReporter {
    async fn directories_resolved(&self, directories: &[SourceDirectory]) {
        tracing::info!("Scanning {} source directories", directories.len());
    }

    async fn class_skipped(&self, class: &ClassIdentifier, error: &ReflectionError) {
        tracing::warn!(class = %class, "Error while reflecting class: {}", error);
    }

    async fn completed(&self, stats: &DiscoveryStats) {
        tracing::info!(
            "Found {} listener(s) for {} event(s) in {}ms",
            stats.listeners,
            stats.events,
            stats.elapsed.as_millis()
        );
    }
}
