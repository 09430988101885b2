//! Listener filter
//!
//! Decides from structural metadata whether a class is an eligible listener and
//! which of its methods are event handlers. A class that does not match simply
//! contributes nothing; this stage never fails.

use tracing::{debug, trace};

use crate::types::{ClassMetadata, HandlerDescriptor, MethodDescriptor};

/// Marker interface listeners implement unless configured otherwise
pub const DEFAULT_MARKER_INTERFACE: &str = "WyriHaximus\\Broadcast\\Marker\\Listener";

/// Prefix reserved for magic/lifecycle methods
const RESERVED_PREFIX: &str = "__";

/// Selects handler methods from listener classes
#[derive(Debug, Clone)]
pub struct ListenerFilter {
    marker: String,
}

impl Default for ListenerFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_INTERFACE)
    }
}

impl ListenerFilter {
    /// Create a filter for classes implementing `marker`
    pub fn new(marker: impl AsRef<str>) -> Self {
        Self {
            marker: marker.as_ref().trim_start_matches('\\').to_string(),
        }
    }

    /// Marker interface this filter looks for
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether the class as a whole qualifies as a listener
    pub fn is_listener(&self, class: &ClassMetadata) -> bool {
        class.instantiable && class.implements(&self.marker)
    }

    /// Extract the handler descriptors of one class
    ///
    /// Descriptors are returned in method declaration order.
    pub fn extract(&self, class: &ClassMetadata) -> Vec<HandlerDescriptor> {
        if !class.instantiable {
            trace!(class = %class.name, "Skipping non-instantiable class");
            return Vec::new();
        }

        if !class.implements(&self.marker) {
            trace!(class = %class.name, "Skipping class without listener marker");
            return Vec::new();
        }

        class
            .methods
            .iter()
            .filter_map(|method| self.handler_for(class, method))
            .collect()
    }

    fn handler_for(
        &self,
        class: &ClassMetadata,
        method: &MethodDescriptor,
    ) -> Option<HandlerDescriptor> {
        if !method.is_public() || method.name.starts_with(RESERVED_PREFIX) {
            return None;
        }

        let [parameter] = method.parameters.as_slice() else {
            return None;
        };

        let Some(event_type) = parameter.type_hint.as_deref().filter(|t| !t.is_empty()) else {
            debug!(
                class = %class.name,
                method = %method.name,
                "Handler candidate has no declared parameter type"
            );
            return None;
        };

        Some(HandlerDescriptor::new(
            event_type,
            class.name.as_str(),
            &method.name,
            method.is_static,
        ))
    }
}
