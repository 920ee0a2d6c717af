use std::sync::Arc;

use weave_core::prelude::*;

struct Database;
struct Cache;

/// Plain, tagged and grouped fields.
#[derive(Clone, Inject)]
struct Handlers {
    db: Arc<Database>,
    #[inject(tag = "hot")]
    #[inject(tag = "local")]
    cache: Arc<Cache>,
    caches: Vec<Arc<Cache>>,
}

fn main() {
    let dependencies = <Handlers as Inject>::dependencies();
    assert_eq!(dependencies.len(), 3);
    assert_eq!(dependencies[1].tags(), &Tags::from(["hot", "local"]));
    assert!(dependencies[2].key().is_group());
}
