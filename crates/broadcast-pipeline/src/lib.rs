//! Discovery Orchestration Layer
//!
//! This crate wires the collaborators from `broadcast-core` into a complete run.
//!
//! ## Architecture
//!
//! 1. **Bootstrap**: Build the class locator, creating missing autoload directories
//! 2. **Discover**: Resolve, enumerate, reflect and filter with bounded concurrency
//! 3. **Aggregate**: Fold handler descriptors into the registry in enumeration order
//! 4. **Write**: Render the registry into the template and replace the artifact atomically
//!
//! ## Clear Separation of Concerns
//!
//! Infrastructure crates (DO NOT orchestrate):
//! - `broadcast-config`: Just reads configuration and manifests
//! - `broadcast-parser`: Just parses, locates and reflects PHP sources
//!
//! This crate (broadcast-pipeline):
//! - Owns task scheduling and the single-writer aggregation task
//! - Decides which failures abort a run
//! - Provides one entry point for the CLI and for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use broadcast_pipeline::{DiscoveryPipeline, ArtifactWriter};
//!
//! let pipeline = DiscoveryPipeline::new(resolver, enumerator, reflector);
//! let outcome = pipeline.run().await?;
//! writer.write(&outcome.registry).await?;
//! ```

pub mod artifact;
pub mod bootstrap;
pub mod discovery;
pub mod error;

pub use artifact::{ArtifactWriter, WriteStatus};
pub use bootstrap::{bootstrap, bootstrap_locator};
pub use discovery::{rounded_seconds, DiscoveryOutcome, DiscoveryPipeline, DiscoveryPipelineConfig};
pub use error::PipelineError;
