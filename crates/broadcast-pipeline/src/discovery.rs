//! Listener Discovery Orchestrator
//!
//! ## Pipeline Architecture
//!
//! 1. **Resolve**: List source directories through the injected `PathResolver`
//! 2. **Enumerate**: Turn directories into class identifiers
//! 3. **Reflect + Filter**: One task per class, bounded by a semaphore
//! 4. **Aggregate**: A single task folds contributions in enumeration order
//!
//! Reflection tasks complete in any order. Each sends `(index, contribution)`
//! to the aggregation task, which buffers out-of-order results and folds them
//! strictly by index, so the registry only depends on enumeration order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info};

use broadcast_core::{
    ClassEnumerator, ClassIdentifier, DiscoveryReporter, DiscoveryStats, EventAggregator,
    EventRegistry, HandlerDescriptor, ListenerFilter, NoOpReporter, PathResolver, ReflectionError,
    Reflector, DEFAULT_MARKER_INTERFACE,
};

use crate::error::PipelineError;

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct DiscoveryPipelineConfig {
    /// Maximum number of reflections in flight
    pub concurrency: usize,
    /// Interface identifying listener classes
    pub marker_interface: String,
}

impl Default for DiscoveryPipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            marker_interface: DEFAULT_MARKER_INTERFACE.to_string(),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub registry: EventRegistry,
    pub stats: DiscoveryStats,
}

/// What one reflected class contributes to the registry
#[derive(Debug)]
enum Contribution {
    Handlers(Vec<HandlerDescriptor>),
    Skipped(ClassIdentifier, ReflectionError),
}

/// Totals produced by the aggregation task
struct Aggregated {
    registry: EventRegistry,
    listeners: usize,
    skipped: usize,
}

/// The discovery orchestrator
///
/// ```text
/// DiscoveryPipeline (orchestration)
///   ├─> PathResolver     (directories)
///   ├─> ClassEnumerator  (class identifiers)
///   ├─> Reflector        (per-class metadata, fan-out)
///   ├─> ListenerFilter   (handler descriptors)
///   └─> EventAggregator  (registry, fan-in)
/// ```
pub struct DiscoveryPipeline {
    resolver: Arc<dyn PathResolver>,
    enumerator: Arc<dyn ClassEnumerator>,
    reflector: Arc<dyn Reflector>,
    reporter: Arc<dyn DiscoveryReporter>,
    config: DiscoveryPipelineConfig,
}

impl DiscoveryPipeline {
    /// Create a new pipeline with dependencies (uses default config)
    pub fn new(
        resolver: Arc<dyn PathResolver>,
        enumerator: Arc<dyn ClassEnumerator>,
        reflector: Arc<dyn Reflector>,
    ) -> Self {
        Self::with_config(
            resolver,
            enumerator,
            reflector,
            DiscoveryPipelineConfig::default(),
        )
    }

    /// Create a new pipeline with custom configuration
    pub fn with_config(
        resolver: Arc<dyn PathResolver>,
        enumerator: Arc<dyn ClassEnumerator>,
        reflector: Arc<dyn Reflector>,
        config: DiscoveryPipelineConfig,
    ) -> Self {
        Self {
            resolver,
            enumerator,
            reflector,
            reporter: Arc::new(NoOpReporter),
            config,
        }
    }

    /// Replace the progress reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn DiscoveryReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &DiscoveryPipelineConfig {
        &self.config
    }

    /// Run discovery end to end
    ///
    /// # Errors
    ///
    /// Any fatal collaborator error. In-flight reflections are aborted and no
    /// registry is produced.
    pub async fn run(&self) -> Result<DiscoveryOutcome, PipelineError> {
        let start = Instant::now();

        let directories = self.resolver.list_source_directories().await?;
        debug!("Resolved {} source directories", directories.len());

        let classes = self.enumerator.enumerate(&directories).await?;
        info!("Enumerated {} classes", classes.len());
        self.reporter.directories_resolved(&directories).await;
        let class_count = classes.len();

        let concurrency = self.config.concurrency.max(1);
        let (tx, rx) = mpsc::channel(concurrency * 2);
        let aggregator = tokio::spawn(aggregate(rx, Arc::clone(&self.reporter)));

        let result = self.fan_out(classes, tx, concurrency).await;
        if let Err(e) = result {
            aggregator.abort();
            return Err(e);
        }

        let aggregated = aggregator.await.map_err(PipelineError::from_join)?;

        let stats = DiscoveryStats {
            directories: directories.len(),
            classes: class_count,
            skipped: aggregated.skipped,
            listeners: aggregated.listeners,
            events: aggregated.registry.event_count(),
            elapsed: start.elapsed(),
        };
        info!(
            listeners = stats.listeners,
            events = stats.events,
            skipped = stats.skipped,
            "Discovery complete in {:?}",
            stats.elapsed
        );
        self.reporter.completed(&stats).await;

        Ok(DiscoveryOutcome {
            registry: aggregated.registry,
            stats,
        })
    }

    /// Spawn one reflection task per class and join them all
    async fn fan_out(
        &self,
        classes: Vec<ClassIdentifier>,
        tx: mpsc::Sender<(usize, Contribution)>,
        concurrency: usize,
    ) -> Result<(), PipelineError> {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let filter = ListenerFilter::new(&self.config.marker_interface);
        let mut tasks: JoinSet<Result<(), PipelineError>> = JoinSet::new();

        for (index, class) in classes.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::Cancelled)?;

            // Surface fatal errors from finished tasks before spawning more
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = flatten(joined) {
                    tasks.abort_all();
                    return Err(e);
                }
            }

            let reflector = Arc::clone(&self.reflector);
            let filter = filter.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let _permit = permit; // Release on drop

                let contribution = match reflector.reflect(&class).await {
                    Ok(metadata) => Contribution::Handlers(filter.extract(&metadata)),
                    Err(e) if e.is_recoverable() => Contribution::Skipped(class, e),
                    Err(e) => return Err(PipelineError::Reflection(e)),
                };

                tx.send((index, contribution))
                    .await
                    .map_err(|_| PipelineError::Cancelled)
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = flatten(joined) {
                tasks.abort_all();
                return Err(e);
            }
        }

        Ok(())
    }
}

fn flatten(
    joined: Result<Result<(), PipelineError>, tokio::task::JoinError>,
) -> Result<(), PipelineError> {
    joined.map_err(PipelineError::from_join)?
}

/// Fold contributions in index order
///
/// Runs until every sender is dropped. Out-of-order contributions wait in a
/// reorder buffer until all lower indices have been folded.
async fn aggregate(
    mut rx: mpsc::Receiver<(usize, Contribution)>,
    reporter: Arc<dyn DiscoveryReporter>,
) -> Aggregated {
    let mut aggregator = EventAggregator::new();
    let mut pending = BTreeMap::new();
    let mut next = 0usize;
    let mut skipped = 0usize;

    while let Some((index, contribution)) = rx.recv().await {
        pending.insert(index, contribution);

        while let Some(contribution) = pending.remove(&next) {
            match contribution {
                Contribution::Handlers(handlers) => aggregator.fold_all(handlers),
                Contribution::Skipped(class, error) => {
                    skipped += 1;
                    reporter.class_skipped(&class, &error).await;
                }
            }
            next += 1;
        }
    }

    debug_assert!(pending.is_empty(), "contributions left unfolded");

    Aggregated {
        listeners: aggregator.folded(),
        registry: aggregator.finish(),
        skipped,
    }
}

/// Round a duration to seconds with two decimals, for user-facing summaries
pub fn rounded_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
