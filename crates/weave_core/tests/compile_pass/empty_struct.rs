use weave_core::prelude::*;

/// A struct without fields injects trivially.
#[derive(Clone, Inject)]
struct Marker {}

fn main() {
    let mut container = Container::new();
    let _marker: Marker = container.resolve_injected().unwrap();
    assert!(<Marker as Inject>::dependencies().is_empty());
}
