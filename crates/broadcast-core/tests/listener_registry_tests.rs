//! Filter -> aggregate -> emit without any I/O
//!
//! Mirrors what the discovery pipeline does for a fixed set of reflected classes.

use broadcast_core::{
    ClassMetadata, EventRegistry, HandlerRecord, ListenerFilter, MethodDescriptor,
    ParameterDescriptor, RegistryEmitter, Visibility, DEFAULT_MARKER_INTERFACE,
};

fn event(ty: &str) -> Vec<ParameterDescriptor> {
    vec![ParameterDescriptor::new("e", Some(ty))]
}

fn fixture_classes() -> Vec<ClassMetadata> {
    let a = ClassMetadata::new("A")
        .with_interface(DEFAULT_MARKER_INTERFACE)
        .with_method(MethodDescriptor::public("onFoo", event("FooEvent")));

    let b = ClassMetadata::new("B")
        .with_interface(DEFAULT_MARKER_INTERFACE)
        .with_method(MethodDescriptor::public("onBar", event("BarEvent")))
        .with_method(
            MethodDescriptor::public("secret", event("BarEvent")).with_visibility(Visibility::Private),
        )
        .with_method(MethodDescriptor::public(
            "pair",
            vec![
                ParameterDescriptor::new("a", Some("FooEvent")),
                ParameterDescriptor::new("b", Some("BarEvent")),
            ],
        ));

    let c = ClassMetadata::new("C")
        .with_method(MethodDescriptor::public("onFoo", event("FooEvent")))
        .with_method(MethodDescriptor::public("onBar", event("BarEvent")));

    vec![a, b, c]
}

fn build_registry(classes: &[ClassMetadata]) -> EventRegistry {
    let filter = ListenerFilter::default();
    EventRegistry::from_descriptors(classes.iter().flat_map(|class| filter.extract(class)))
}

#[test]
fn test_end_to_end_example() {
    let registry = build_registry(&fixture_classes());

    let events: Vec<_> = registry.event_types().collect();
    assert_eq!(events, vec!["FooEvent", "BarEvent"]);
    assert_eq!(
        registry.handlers("FooEvent").unwrap(),
        &[HandlerRecord::new("A", "onFoo", false)]
    );
    assert_eq!(
        registry.handlers("BarEvent").unwrap(),
        &[HandlerRecord::new("B", "onBar", false)]
    );

    let json = serde_json::to_value(&registry).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "FooEvent": [{"class": "A", "method": "onFoo", "static": false}],
            "BarEvent": [{"class": "B", "method": "onBar", "static": false}],
        })
    );
}

#[test]
fn test_identical_inputs_emit_identical_bytes() {
    let emitter = RegistryEmitter::default();

    let first = emitter.literal(&build_registry(&fixture_classes())).unwrap();
    let second = emitter.literal(&build_registry(&fixture_classes())).unwrap();

    assert_eq!(first, second);
    assert!(first.contains("'FooEvent' => "));
    assert!(!first.contains("'C'"));
}
