//! The internal crate re-exports the full API, including the derive macro.

use std::sync::Arc;

use weave_internal::prelude::*;

struct Clock;

#[derive(Clone, Inject)]
struct Scheduler {
    #[inject(tag = "primary")]
    clock: Arc<Clock>,
    #[inject(tag = "fallback")]
    backup: Arc<Clock>,
}

#[test]
fn derive_resolves_through_the_reexports() {
    let mut container = Container::new();
    container
        .provide(Provider::value(Arc::new(Clock)).tagged("primary"))
        .provide(Provider::value(Arc::new(Clock)).tagged("fallback"));

    let scheduler = container.resolve_injected::<Scheduler>().unwrap();
    assert!(!Arc::ptr_eq(&scheduler.clock, &scheduler.backup));

    // Untagged lookups see both clocks.
    let Err(error) = container.resolve::<Arc<Clock>>() else {
        panic!("two clocks match an untagged lookup");
    };
    assert!(matches!(error, Error::Ambiguous { .. }));
}

#[test]
fn modules_and_graph_export_compose() {
    let mut container = Container::new();
    container
        .add_modules(TracingModule::new().with_format(TracingFormat::Compact))
        .unwrap();
    container.provide(Provider::new(|config: Arc<TracingConfig>| {
        Arc::new(config.format)
    }));
    container.finish().unwrap();

    let graph = container.dependency_graph().unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(
        *container.resolve::<Arc<TracingFormat>>().unwrap(),
        TracingFormat::Compact
    );
}
