//! End-to-end resolution tests for `weave_core`.
//!
//! These tests cover singleton identity, groups, tag filtering, cycles,
//! field injection, factory failures and cleanup through the public API.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use weave_core::key::{Dependency, TypeKey};
use weave_core::prelude::*;

// ─────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Logger;

#[derive(Debug)]
struct Service {
    logger: Arc<Logger>,
}

trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
}

struct NamedPlugin(&'static str);

impl Plugin for NamedPlugin {
    fn name(&self) -> &'static str {
        self.0
    }
}

fn plugin_names(plugins: &[Arc<dyn Plugin>]) -> Vec<&'static str> {
    plugins.iter().map(|plugin| plugin.name()).collect()
}

fn with_plugins() -> Container {
    let mut container = Container::new();
    for name in ["a", "b", "c"] {
        container.provide(
            Provider::new(move || Arc::new(NamedPlugin(name)))
                .tagged(name)
                .bind(|plugin: Arc<NamedPlugin>| plugin as Arc<dyn Plugin>),
        );
    }
    container
}

// ─────────────────────────────────────────────────────────────────────────
// Singletons
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn service_shares_the_logger_singleton() {
    let mut container = Container::new();
    container
        .provide(Provider::new(|| Arc::new(Logger)))
        .provide(Provider::new(|logger: Arc<Logger>| {
            Arc::new(Service { logger })
        }));

    let service = container.resolve::<Arc<Service>>().unwrap();
    let logger = container.resolve::<Arc<Logger>>().unwrap();

    assert!(Arc::ptr_eq(&service.logger, &logger));
}

#[test]
fn repeated_resolution_returns_the_same_handle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut container = Container::new();
    container.provide(Provider::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(Logger)
    }));

    let first = container.resolve::<Arc<Logger>>().unwrap();
    let second = container.resolve::<Arc<Logger>>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn interface_binding_shares_the_concrete_value() {
    let mut container = with_plugins();
    let concrete = container
        .resolve_tagged::<Arc<NamedPlugin>>(&Tags::from(["b"]))
        .unwrap();
    let interface = container
        .resolve_tagged::<Arc<dyn Plugin>>(&Tags::from(["b"]))
        .unwrap();

    assert_eq!(interface.name(), "b");
    assert!(core::ptr::addr_eq(Arc::as_ptr(&concrete), Arc::as_ptr(&interface)));
}

// ─────────────────────────────────────────────────────────────────────────
// Groups and Tags
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn group_without_filter_returns_every_plugin_in_order() {
    let mut container = with_plugins();

    let plugins = container
        .resolve_group::<Arc<dyn Plugin>>(&Tags::new())
        .unwrap();
    assert_eq!(plugin_names(&plugins), vec!["a", "b", "c"]);

    let again = container
        .resolve_group::<Arc<dyn Plugin>>(&Tags::new())
        .unwrap();
    assert!(
        plugins
            .iter()
            .zip(&again)
            .all(|(left, right)| Arc::ptr_eq(left, right))
    );
}

#[test]
fn group_with_filter_returns_matching_plugins() {
    let mut container = with_plugins();

    let plugins = container
        .resolve_group::<Arc<dyn Plugin>>(&Tags::from(["a"]))
        .unwrap();
    assert_eq!(plugin_names(&plugins), vec!["a"]);
}

#[test]
fn empty_group_is_not_found() {
    let mut container = with_plugins();

    let Err(error) = container.resolve_group::<Arc<dyn Plugin>>(&Tags::from(["z"])) else {
        panic!("no plugin is tagged z");
    };
    assert!(error.is_not_found());
    assert!(error.to_string().contains("[z]"));
}

#[test]
fn resolving_a_vec_collects_the_group() {
    let mut container = with_plugins();

    let plugins = container.resolve::<Vec<Arc<dyn Plugin>>>().unwrap();
    assert_eq!(plugin_names(&plugins), vec!["a", "b", "c"]);

    let tagged = container
        .resolve_tagged::<Vec<Arc<dyn Plugin>>>(&Tags::from(["b"]))
        .unwrap();
    assert_eq!(plugin_names(&tagged), vec!["b"]);
}

#[test]
fn groups_resolved_early_include_later_providers() {
    let mut container = with_plugins();
    let before = container.resolve_group::<Arc<dyn Plugin>>(&Tags::new()).unwrap();
    assert_eq!(before.len(), 3);

    container.provide(
        Provider::new(|| Arc::new(NamedPlugin("d")))
            .tagged("d")
            .bind(|plugin: Arc<NamedPlugin>| plugin as Arc<dyn Plugin>),
    );
    let after = container.resolve_group::<Arc<dyn Plugin>>(&Tags::new()).unwrap();
    assert_eq!(plugin_names(&after), vec!["a", "b", "c", "d"]);
    assert!(Arc::ptr_eq(&before[0], &after[0]));
}

#[test]
fn factories_can_take_groups() {
    let mut container = with_plugins();
    let names = container
        .invoke(|plugins: Vec<Arc<dyn Plugin>>| plugin_names(&plugins).join(","))
        .unwrap();
    assert_eq!(names, "a,b,c");
}

#[test]
fn identical_tags_are_ambiguous() {
    let mut container = Container::new();
    container
        .provide(Provider::new(|| Arc::new(Logger)).tagged("x"))
        .provide(Provider::new(|| Arc::new(Logger)).tagged("x"));

    let error = container
        .resolve_tagged::<Arc<Logger>>(&Tags::from(["x"]))
        .unwrap_err();
    assert!(matches!(error, Error::Ambiguous { .. }));
    assert!(error.to_string().contains("Vec<"));

    let both = container
        .resolve_group::<Arc<Logger>>(&Tags::from(["x"]))
        .unwrap();
    assert_eq!(both.len(), 2);
}

#[test]
fn tag_filters_match_exactly() {
    let mut container = Container::new();
    container
        .provide(Provider::value(Arc::new(String::from("a"))).tagged("a"))
        .provide(Provider::value(Arc::new(String::from("a,b"))).tagged("a").tagged("b"));

    let only_a = container.resolve_tagged::<Arc<String>>(&Tags::from(["a"])).unwrap();
    assert_eq!(only_a.as_str(), "a");
    let both = container
        .resolve_tagged::<Arc<String>>(&Tags::from(["b", "a"]))
        .unwrap();
    assert_eq!(both.as_str(), "a,b");
    assert!(
        container
            .resolve_tagged::<Arc<String>>(&Tags::from(["b"]))
            .unwrap_err()
            .is_not_found()
    );
    assert!(matches!(
        container.resolve::<Arc<String>>(),
        Err(Error::Ambiguous { .. })
    ));
}

#[test]
fn tagged_params_select_providers() {
    struct Replica;
    impl Tag for Replica {
        const NAME: &'static str = "replica";
    }

    let mut container = Container::new();
    container
        .provide(Provider::value(Arc::new(String::from("primary"))).tagged("primary"))
        .provide(Provider::value(Arc::new(String::from("replica"))).tagged("replica"));

    let url = container
        .invoke(|url: Tagged<Arc<String>, Replica>| url.as_str().to_owned())
        .unwrap();
    assert_eq!(url, "replica");
}

// ─────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn unregistered_type_is_not_found() {
    let mut container = Container::new();
    let error = container.resolve::<Arc<Logger>>().unwrap_err();

    assert!(matches!(error, Error::NotRegistered { .. }));
    assert!(error.to_string().contains("Logger"));
}

#[derive(Debug)]
struct A;

#[derive(Debug)]
struct B;

#[test]
fn cycles_fail_before_any_factory_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (for_a, for_b) = (Arc::clone(&calls), Arc::clone(&calls));

    let mut container = Container::new();
    container
        .provide(Provider::new(move |_: Arc<B>| {
            for_a.fetch_add(1, Ordering::SeqCst);
            Arc::new(A)
        }))
        .provide(Provider::new(move |_: Arc<A>| {
            for_b.fetch_add(1, Ordering::SeqCst);
            Arc::new(B)
        }));

    assert!(matches!(container.finish(), Err(Error::Cycle { .. })));
    assert!(matches!(container.validate(), Err(Error::Cycle { .. })));

    let error = container.resolve::<Arc<A>>().unwrap_err();
    let Error::Cycle { path, .. } = &error else {
        panic!("expected a cycle, got {error}");
    };
    assert_eq!(path.first(), path.last());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn factory_errors_surface_verbatim() {
    #[derive(Debug, thiserror::Error)]
    #[error("database unreachable")]
    struct Unreachable;

    let mut container = Container::new();
    container.provide(Provider::try_new(|| Err::<Arc<Logger>, _>(Unreachable)));

    let error = container.resolve::<Arc<Logger>>().unwrap_err();
    assert_eq!(error.to_string(), "database unreachable");
    assert!(
        error
            .factory_error()
            .is_some_and(|source| source.is::<Unreachable>())
    );
}

#[test]
fn failed_dependency_aborts_the_dependent() {
    let mut container = Container::new();
    container
        .provide(Provider::try_new(|| Err::<Arc<Logger>, _>("no logger")))
        .provide(Provider::new(|logger: Arc<Logger>| {
            Arc::new(Service { logger })
        }));

    let error = container.resolve::<Arc<Service>>().unwrap_err();
    assert_eq!(error.to_string(), "no logger");
}

// ─────────────────────────────────────────────────────────────────────────
// Field Injection
// ─────────────────────────────────────────────────────────────────────────

#[derive(Clone, Inject)]
struct Handlers {
    logger: Arc<Logger>,
    #[inject(tag = "c")]
    plugin: Arc<dyn Plugin>,
    plugins: Vec<Arc<dyn Plugin>>,
}

#[test]
fn structs_are_assembled_from_fields() {
    let mut container = with_plugins();
    container.provide(Provider::new(|| Arc::new(Logger)));

    let handlers = container.resolve_injected::<Handlers>().unwrap();
    let logger = container.resolve::<Arc<Logger>>().unwrap();

    assert!(Arc::ptr_eq(&handlers.logger, &logger));
    assert_eq!(handlers.plugin.name(), "c");
    assert_eq!(plugin_names(&handlers.plugins), vec!["a", "b", "c"]);
}

#[test]
fn injected_structs_can_be_factory_params() {
    let mut container = with_plugins();
    container
        .provide(Provider::new(|| Arc::new(Logger)))
        .provide(Provider::new(|handlers: Injected<Handlers>| {
            Arc::new(Service {
                logger: Arc::clone(&handlers.logger),
            })
        }));

    let service = container.resolve::<Arc<Service>>().unwrap();
    let logger = container.resolve::<Arc<Logger>>().unwrap();
    assert!(Arc::ptr_eq(&service.logger, &logger));

    let handlers = container.resolve::<Injected<Handlers>>().unwrap();
    assert!(Arc::ptr_eq(&handlers.logger, &logger));
    assert_eq!(handlers.plugin.name(), "c");
}

#[test]
fn pointer_injection_is_rejected() {
    let mut container = with_plugins();
    container.provide(Provider::new(|| Arc::new(Logger)));

    let dependency = Dependency::pointer::<Arc<Handlers>>();
    let error = container.resolve_dependency(&dependency).unwrap_err();

    let Error::UnsupportedInjection { pointee, .. } = &error else {
        panic!("expected unsupported injection, got {error}");
    };
    assert!(pointee.ends_with("Handlers"));
}

#[test]
fn explicit_providers_take_precedence_over_field_injection() {
    let mut container = with_plugins();
    let logger = Arc::new(Logger);
    container.provide_value(Handlers {
        logger: Arc::clone(&logger),
        plugin: Arc::new(NamedPlugin("explicit")),
        plugins: Vec::new(),
    });

    let handlers = container.resolve_injected::<Handlers>().unwrap();
    assert_eq!(handlers.plugin.name(), "explicit");
    assert!(Arc::ptr_eq(&handlers.logger, &logger));
}

#[test]
fn injected_node_is_cached() {
    let mut container = with_plugins();
    container.provide(Provider::new(|| Arc::new(Logger)));

    let key = TypeKey::injectable::<Handlers>();
    let registry = container.registry_mut();
    let first = registry.find(&key, &Tags::new()).unwrap();
    let second = registry.find(&key, &Tags::new()).unwrap();
    assert_eq!(first, second);
}

// ─────────────────────────────────────────────────────────────────────────
// Cleanup
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn cleanup_runs_in_reverse_construction_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (logger_log, service_log) = (Arc::clone(&log), Arc::clone(&log));

    let mut container = Container::new();
    container
        .provide(Provider::with_cleanup(move || {
            let log = Arc::clone(&logger_log);
            Ok::<_, BoxError>((Arc::new(Logger), move || log.lock().push("logger")))
        }))
        .provide(Provider::with_cleanup(move |logger: Arc<Logger>| {
            let log = Arc::clone(&service_log);
            Ok::<_, BoxError>((
                Arc::new(Service { logger }),
                move || log.lock().push("service"),
            ))
        }));

    container.resolve::<Arc<Service>>().unwrap();
    assert_eq!(container.registry().cleanup_count(), 2);

    container.cleanup();
    assert_eq!(*log.lock(), vec!["service", "logger"]);
    assert_eq!(container.registry().cleanup_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn whole_validation_reports_missing_dependencies_early() {
    let mut container = Container::new();
    container
        .provide(Provider::new(|_: Arc<Service>| Arc::new(B)))
        .provide(Provider::new(|| Arc::new(Logger)));

    assert!(matches!(container.finish(), Err(Error::NotRegistered { .. })));
    assert!(container.resolve::<Arc<Logger>>().is_ok());
    assert!(matches!(
        container.resolve::<Arc<B>>(),
        Err(Error::NotRegistered { .. })
    ));
}

#[test]
fn failed_validation_still_rejects_cycles() {
    let mut container = Container::new();
    container
        .provide(Provider::new(|_: Arc<B>| Arc::new(A)))
        .provide(Provider::new(|_: Arc<A>| Arc::new(B)))
        .provide(Provider::new(|| Arc::new(Logger)));

    assert!(matches!(container.finish(), Err(Error::Cycle { .. })));
    for _ in 0..2 {
        assert!(container.resolve::<Arc<Logger>>().is_ok());
        assert!(matches!(
            container.resolve::<Arc<A>>(),
            Err(Error::Cycle { .. })
        ));
    }
}

#[test]
fn reachable_validation_resolves_healthy_subgraphs() {
    let config = ContainerConfig::default().with_validation(Validation::Reachable);
    let mut container = Container::with_config(config);
    container
        .provide(Provider::new(|| Arc::new(Logger)))
        .provide(Provider::new(|_: Arc<A>| Arc::new(B)));

    container.finish().unwrap();
    assert!(container.resolve::<Arc<Logger>>().is_ok());
    assert!(matches!(
        container.resolve::<Arc<B>>(),
        Err(Error::NotRegistered { .. })
    ));
}
