//! End-to-end tests of the discovery pipeline with in-memory collaborators

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use tracing_test::traced_test;

use broadcast_core::{
    ClassMetadata, HandlerRecord, MethodDescriptor, ParameterDescriptor, ReflectionError,
    RegistryEmitter, Visibility,
};
use broadcast_pipeline::{
    ArtifactWriter, DiscoveryPipeline, DiscoveryPipelineConfig, PipelineError,
};

use common::{listener, MockReflector, RecordingReporter, StaticEnumerator, StaticResolver};

fn pipeline(
    classes: &[&str],
    reflector: MockReflector,
    concurrency: usize,
) -> DiscoveryPipeline {
    DiscoveryPipeline::with_config(
        Arc::new(StaticResolver::single()),
        Arc::new(StaticEnumerator::new(classes)),
        Arc::new(reflector),
        DiscoveryPipelineConfig {
            concurrency,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_unresolvable_classes_are_skipped() -> Result<()> {
    let classes: Vec<String> = (0..10).map(|i| format!("App\\Listener{i}")).collect();
    let names: Vec<&str> = classes.iter().map(String::as_str).collect();

    let mut reflector = MockReflector::new();
    for (i, class) in names.iter().enumerate() {
        reflector = if [2, 5, 7].contains(&i) {
            reflector.with_error(
                class,
                ReflectionError::not_found(*class, "Parent class \"App\\Gone\" could not be found"),
            )
        } else {
            reflector.with_class(listener(class, &[("handle", "App\\Event\\Tick")]))
        };
    }

    let reporter = RecordingReporter::default();
    let outcome = pipeline(&names, reflector.clone(), 3)
        .with_reporter(Arc::new(reporter.clone()))
        .run()
        .await?;

    let handlers: Vec<_> = outcome
        .registry
        .handlers("App\\Event\\Tick")
        .unwrap()
        .iter()
        .map(|h| h.class.clone())
        .collect();
    let expected: Vec<String> = [0, 1, 3, 4, 6, 8, 9]
        .iter()
        .map(|i| format!("App\\Listener{i}"))
        .collect();
    assert_eq!(handlers, expected);

    assert_eq!(outcome.stats.classes, 10);
    assert_eq!(outcome.stats.skipped, 3);
    assert_eq!(outcome.stats.listeners, 7);
    assert_eq!(outcome.stats.events, 1);
    assert_eq!(reflector.calls().len(), 10);

    let skipped: Vec<_> = reporter
        .skipped
        .lock()
        .unwrap()
        .iter()
        .map(|(class, _)| class.clone())
        .collect();
    assert_eq!(skipped, vec!["App\\Listener2", "App\\Listener5", "App\\Listener7"]);
    assert_eq!(*reporter.directories.lock().unwrap(), vec![1]);
    assert_eq!(reporter.completed.lock().unwrap().as_ref().map(|s| s.skipped), Some(3));

    Ok(())
}

#[tokio::test]
async fn test_fatal_error_aborts_without_artifact() -> Result<()> {
    let temp = TempDir::new()?;
    let template = temp.path().join("template.php");
    let target = temp.path().join("Provider.php");
    std::fs::write(&template, "<?php\nconst LISTENERS = ['%s'];\n")?;
    std::fs::write(&target, "previous")?;

    let reflector = MockReflector::new()
        .with_class(listener("App\\First", &[("handle", "App\\Event")]))
        .with_error("App\\Broken", ReflectionError::fatal("App\\Broken", "unexpected token"))
        .with_class(listener("App\\Slow", &[("handle", "App\\Event")]))
        .with_delay("App\\Slow", Duration::from_millis(200));

    let reporter = RecordingReporter::default();
    let writer = ArtifactWriter::new(&template, &target, RegistryEmitter::default());

    let result = pipeline(&["App\\First", "App\\Broken", "App\\Slow"], reflector.clone(), 4)
        .with_reporter(Arc::new(reporter.clone()))
        .run()
        .await;

    if let Ok(outcome) = &result {
        writer.write(&outcome.registry).await?;
    }

    match result {
        Err(PipelineError::Reflection(ReflectionError::Fatal { class, .. })) => {
            assert_eq!(class, "App\\Broken");
        }
        other => panic!("expected fatal reflection error, got {other:?}"),
    }

    assert!(reporter.completed.lock().unwrap().is_none());
    assert_eq!(std::fs::read_to_string(&target)?, "previous");

    // The slow reflection was still in flight and must have been cancelled
    tokio::time::sleep(Duration::from_millis(400)).await;
    let finished = reflector.finished();
    assert!(finished.contains(&"App\\First".to_string()));
    assert!(!finished.contains(&"App\\Slow".to_string()), "{finished:?}");

    Ok(())
}

#[tokio::test]
async fn test_registry_is_independent_of_completion_order() -> Result<()> {
    let classes: Vec<String> = (0..24).map(|i| format!("App\\Listener{i:02}")).collect();
    let names: Vec<&str> = classes.iter().map(String::as_str).collect();

    // Later classes finish first in the first run and last in the second
    let build = |reverse: bool| {
        names.iter().enumerate().fold(MockReflector::new(), |reflector, (i, class)| {
            let rank = if reverse { i } else { names.len() - i };
            let event = if i % 3 == 0 { "App\\Event\\Created" } else { "App\\Event\\Deleted" };
            reflector
                .with_class(listener(class, &[("on", event), ("handle", "App\\Event\\Any")]))
                .with_delay(class, Duration::from_millis((rank as u64 * 7) % 40))
        })
    };

    let emitter = RegistryEmitter::default();
    let first = pipeline(&names, build(false), 8).run().await?;
    let second = pipeline(&names, build(true), 8).run().await?;
    let sequential = pipeline(&names, build(false), 1).run().await?;

    let rendered = emitter.literal(&first.registry)?;
    assert_eq!(rendered, emitter.literal(&second.registry)?);
    assert_eq!(rendered, emitter.literal(&sequential.registry)?);

    let any: Vec<_> = first
        .registry
        .handlers("App\\Event\\Any")
        .unwrap()
        .iter()
        .map(|h| h.class.as_str())
        .collect();
    assert_eq!(any, names);

    let events: Vec<_> = first.registry.event_types().collect();
    assert_eq!(
        events,
        vec!["App\\Event\\Created", "App\\Event\\Any", "App\\Event\\Deleted"]
    );

    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_mixed_listener_fixture() -> Result<()> {
    let foo = |name: &str| vec![ParameterDescriptor::new(name, Some("FooEvent"))];
    let bar = |name: &str| vec![ParameterDescriptor::new(name, Some("BarEvent"))];

    let a = listener("A", &[("onFoo", "FooEvent")]);
    let b = listener("B", &[("onBar", "BarEvent")])
        .with_method(MethodDescriptor::public("hidden", bar("e")).with_visibility(Visibility::Private))
        .with_method(MethodDescriptor::public("__invoke", foo("e")))
        .with_method(MethodDescriptor::public(
            "pair",
            vec![
                ParameterDescriptor::new("a", Some("FooEvent")),
                ParameterDescriptor::new("b", Some("BarEvent")),
            ],
        ));
    let c = ClassMetadata::new("C")
        .with_method(MethodDescriptor::public("onFoo", foo("e")))
        .with_method(MethodDescriptor::public("onBar", bar("e")));

    let reflector = MockReflector::new().with_class(a).with_class(b).with_class(c);
    let outcome = pipeline(&["A", "B", "C"], reflector, 2).run().await?;

    assert_eq!(
        outcome.registry.handlers("FooEvent").unwrap(),
        &[HandlerRecord::new("A", "onFoo", false)]
    );
    assert_eq!(
        outcome.registry.handlers("BarEvent").unwrap(),
        &[HandlerRecord::new("B", "onBar", false)]
    );
    assert_eq!(outcome.stats.events, 2);
    assert_eq!(outcome.stats.listeners, 2);
    assert!(logs_contain("Enumerated 3 classes"));

    Ok(())
}

#[tokio::test]
async fn test_directories_are_reported_after_enumeration() -> Result<()> {
    let reporter = RecordingReporter::default();
    let enumerator = StaticEnumerator::new(&["A"]).with_journal(Arc::clone(&reporter.journal));
    let reflector = MockReflector::new().with_class(listener("A", &[("on", "E")]));

    DiscoveryPipeline::new(
        Arc::new(StaticResolver::single()),
        Arc::new(enumerator),
        Arc::new(reflector),
    )
    .with_reporter(Arc::new(reporter.clone()))
    .run()
    .await?;

    assert_eq!(
        *reporter.journal.lock().unwrap(),
        vec!["enumerate", "directories_resolved", "completed"]
    );

    Ok(())
}

#[tokio::test]
async fn test_no_classes_yields_empty_registry() -> Result<()> {
    let outcome = pipeline(&[], MockReflector::new(), 4).run().await?;

    assert!(outcome.registry.is_empty());
    assert_eq!(outcome.stats.classes, 0);
    assert_eq!(RegistryEmitter::default().literal(&outcome.registry)?, "array (\n)");

    Ok(())
}
