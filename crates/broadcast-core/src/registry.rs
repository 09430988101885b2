//! Event registry and the aggregator that builds it
//!
//! The registry maps an event type to the handlers listening for it. Keys keep
//! first-seen order and every bucket keeps fold order, so the registry content
//! is fully determined by the order descriptors are folded in. Duplicate
//! `(class, method)` pairs are kept as-is.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::HandlerDescriptor;

/// A handler entry inside one registry bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerRecord {
    pub class: String,
    pub method: String,
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl HandlerRecord {
    pub fn new(class: impl Into<String>, method: impl Into<String>, is_static: bool) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            is_static,
        }
    }
}

impl From<HandlerDescriptor> for HandlerRecord {
    fn from(descriptor: HandlerDescriptor) -> Self {
        Self {
            class: descriptor.class_name,
            method: descriptor.method_name,
            is_static: descriptor.is_static,
        }
    }
}

/// Mapping from event type to its ordered handlers
///
/// Every key is non-empty and every bucket holds at least one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRegistry {
    events: IndexMap<String, Vec<HandlerRecord>>,
}

impl EventRegistry {
    /// Fold descriptors in iteration order
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = HandlerDescriptor>) -> Self {
        let mut aggregator = EventAggregator::new();
        aggregator.fold_all(descriptors);
        aggregator.finish()
    }

    /// Handlers registered for `event_type`
    pub fn handlers(&self, event_type: &str) -> Option<&[HandlerRecord]> {
        self.events.get(event_type).map(Vec::as_slice)
    }

    /// Iterate `(event_type, handlers)` in registry order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HandlerRecord])> {
        self.events
            .iter()
            .map(|(event, handlers)| (event.as_str(), handlers.as_slice()))
    }

    /// Event types in registry order
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    /// Number of distinct event types
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Total number of handler records across all events
    pub fn listener_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Single-writer accumulator for handler descriptors
///
/// The aggregator is owned by exactly one task; concurrent producers hand
/// their descriptors to that owner rather than sharing it.
#[derive(Debug, Default)]
pub struct EventAggregator {
    events: IndexMap<String, Vec<HandlerRecord>>,
    folded: usize,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one descriptor to its event bucket
    pub fn fold(&mut self, descriptor: HandlerDescriptor) {
        if descriptor.event_type.is_empty() {
            warn!(
                class = %descriptor.class_name,
                method = %descriptor.method_name,
                "Ignoring handler without event type"
            );
            return;
        }

        let event_type = descriptor.event_type.clone();
        self.events
            .entry(event_type)
            .or_default()
            .push(HandlerRecord::from(descriptor));
        self.folded += 1;
    }

    pub fn fold_all(&mut self, descriptors: impl IntoIterator<Item = HandlerDescriptor>) {
        for descriptor in descriptors {
            self.fold(descriptor);
        }
    }

    /// Descriptors folded so far
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Consume the aggregator, producing the final registry
    pub fn finish(self) -> EventRegistry {
        EventRegistry {
            events: self.events,
        }
    }
}
