//! Common test utilities for pipeline tests.
//!
//! In-memory collaborators standing in for the manifest resolver, the
//! directory enumerator and the source reflector.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use broadcast_core::{
    AutoloadKind, ClassEnumerator, ClassIdentifier, ClassMetadata, DiscoveryReporter,
    DiscoveryStats, EnumerationError, MethodDescriptor, ParameterDescriptor, PathResolver,
    ReflectionError, Reflector, ResolveError, SourceDirectory, DEFAULT_MARKER_INTERFACE,
};

/// Resolver returning a fixed directory list.
pub struct StaticResolver {
    directories: Vec<SourceDirectory>,
}

impl StaticResolver {
    pub fn single() -> Self {
        Self {
            directories: vec![SourceDirectory::new("/project/src", "acme/app", AutoloadKind::Psr4)],
        }
    }
}

#[async_trait]
impl PathResolver for StaticResolver {
    async fn list_source_directories(&self) -> Result<Vec<SourceDirectory>, ResolveError> {
        Ok(self.directories.clone())
    }
}

/// Ordered record of collaborator calls shared between mocks.
pub type Journal = Arc<Mutex<Vec<&'static str>>>;

/// Enumerator returning a fixed class list.
pub struct StaticEnumerator {
    classes: Vec<ClassIdentifier>,
    journal: Option<Journal>,
}

impl StaticEnumerator {
    pub fn new<S: AsRef<str>>(classes: &[S]) -> Self {
        Self {
            classes: classes.iter().map(ClassIdentifier::new).collect(),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }
}

#[async_trait]
impl ClassEnumerator for StaticEnumerator {
    async fn enumerate(
        &self,
        _directories: &[SourceDirectory],
    ) -> Result<Vec<ClassIdentifier>, EnumerationError> {
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push("enumerate");
        }
        Ok(self.classes.clone())
    }
}

/// Mock reflector state
#[derive(Default)]
struct MockReflectorState {
    responses: HashMap<String, Result<ClassMetadata, ReflectionError>>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
    finished: Vec<String>,
}

/// Reflector answering from a table, optionally after a per-class delay.
#[derive(Clone, Default)]
pub struct MockReflector {
    state: Arc<Mutex<MockReflectorState>>,
}

impl MockReflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(self, metadata: ClassMetadata) -> Self {
        let name = metadata.name.as_str().to_string();
        self.state.lock().unwrap().responses.insert(name, Ok(metadata));
        self
    }

    pub fn with_error(self, class: &str, error: ReflectionError) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(class.to_string(), Err(error));
        self
    }

    pub fn with_delay(self, class: &str, delay: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(class.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Classes whose reflection ran to completion
    pub fn finished(&self) -> Vec<String> {
        self.state.lock().unwrap().finished.clone()
    }
}

#[async_trait]
impl Reflector for MockReflector {
    async fn reflect(&self, class: &ClassIdentifier) -> Result<ClassMetadata, ReflectionError> {
        let (delay, response) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(class.as_str().to_string());
            (
                state.delays.get(class.as_str()).copied(),
                state.responses.get(class.as_str()).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .unwrap()
            .finished
            .push(class.as_str().to_string());

        response.unwrap_or_else(|| {
            Err(ReflectionError::not_found(
                class.as_str(),
                format!("Class \"{}\" could not be found in the located source", class),
            ))
        })
    }
}

/// Reporter recording everything it is told.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub directories: Arc<Mutex<Vec<usize>>>,
    pub skipped: Arc<Mutex<Vec<(String, String)>>>,
    pub completed: Arc<Mutex<Option<DiscoveryStats>>>,
    pub journal: Journal,
}

#[async_trait]
impl DiscoveryReporter for RecordingReporter {
    async fn directories_resolved(&self, directories: &[SourceDirectory]) {
        self.directories.lock().unwrap().push(directories.len());
        self.journal.lock().unwrap().push("directories_resolved");
    }

    async fn class_skipped(&self, class: &ClassIdentifier, error: &ReflectionError) {
        self.skipped
            .lock()
            .unwrap()
            .push((class.as_str().to_string(), error.to_string()));
    }

    async fn completed(&self, stats: &DiscoveryStats) {
        *self.completed.lock().unwrap() = Some(stats.clone());
        self.journal.lock().unwrap().push("completed");
    }
}

/// Listener class with one public single-parameter handler per event.
pub fn listener(class: &str, handlers: &[(&str, &str)]) -> ClassMetadata {
    handlers.iter().fold(
        ClassMetadata::new(class).with_interface(DEFAULT_MARKER_INTERFACE),
        |metadata, (method, event)| {
            metadata.with_method(MethodDescriptor::public(
                *method,
                vec![ParameterDescriptor::new("event", Some(*event))],
            ))
        },
    )
}
