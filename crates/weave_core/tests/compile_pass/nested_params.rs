use std::sync::Arc;

use weave_core::prelude::*;

struct Primary;

impl Tag for Primary {
    const NAME: &'static str = "primary";
}

struct Pool;

#[derive(Clone, Inject)]
struct Inner {
    pool: Tagged<Arc<Pool>, Primary>,
}

/// Injected structs and typed tags as field types.
#[derive(Clone, Inject)]
struct Outer {
    inner: Injected<Inner>,
}

fn main() {
    let dependencies = <Outer as Inject>::dependencies();
    assert!(dependencies[0].key().is_injectable());
}
