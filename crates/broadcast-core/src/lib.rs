//! Core types and stages of listener discovery
//!
//! This crate owns the data model and the three pure stages of the discovery
//! pipeline:
//!
//! 1. **Listener Filter** ([`ListenerFilter`]): selects handler methods from reflected classes
//! 2. **Event Aggregator** ([`EventAggregator`]): folds handlers into an [`EventRegistry`]
//! 3. **Registry Emitter** ([`RegistryEmitter`]): serializes the registry into generated source
//!
//! Path resolution, class enumeration and reflection are collaborators behind the
//! traits in [`traits`]; orchestration lives in `broadcast-pipeline`.

pub mod emit;
pub mod error;
pub mod filter;
pub mod registry;
pub mod traits;
pub mod types;

pub use emit::{EmitFormat, RegistryEmitter, Template, PLACEHOLDER};
pub use error::{EnumerationError, ReflectionError, ResolveError, TemplateError};
pub use filter::{ListenerFilter, DEFAULT_MARKER_INTERFACE};
pub use registry::{EventAggregator, EventRegistry, HandlerRecord};
pub use traits::{
    ClassEnumerator, DiscoveryReporter, DiscoveryStats, NoOpReporter, PathResolver, Reflector,
    TracingReporter,
};
pub use types::{
    AutoloadKind, AutoloadMap, ClassIdentifier, ClassMetadata, HandlerDescriptor, MethodDescriptor,
    ParameterDescriptor, Psr4Mapping, SourceDirectory, Visibility,
};
