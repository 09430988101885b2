//! # Broadcast Configuration
//!
//! Tool configuration and Composer manifest handling for listener discovery.
//!
//! ## Features
//!
//! - TOML configuration with defaults for every field
//! - Composer 1 and Composer 2 manifest models
//! - Manifest-based [`PathResolver`](broadcast_core::PathResolver) implementation
//! - Install-path convention for the provider template and generated artifact
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadcast_config::{BroadcastConfig, ManifestPathResolver};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Path::new(".");
//!     let config = BroadcastConfig::load(None, root)?;
//!     let resolver = ManifestPathResolver::load(root, &config.discovery.listener_flag).await?;
//!     let install = resolver.install_path(&config.output.package_name);
//!     println!("{}", install.join(&config.output.target).display());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod manifest;
mod resolver;

pub use config::*;
pub use error::*;
pub use manifest::{Autoload, AutoloadPaths, InstalledManifest, PackageManifest, RootManifest};
pub use resolver::*;
