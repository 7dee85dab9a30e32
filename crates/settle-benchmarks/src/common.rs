//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use serde_json::{Map, Value};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// A settings document with `sections` sections of `keys` settings each.
///
/// `variant` changes every third value so two documents built with different
/// variants overlap partially.
pub fn settings_document(sections: usize, keys: usize, variant: u64) -> Value {
    let mut root = Map::new();
    for section in 0..sections {
        let mut settings = Map::new();
        for key in 0..keys {
            let value = if key % 3 == 0 {
                Value::from(key as u64 + variant)
            } else {
                Value::from(format!("value-{}", key))
            };
            settings.insert(format!("Key{}", key), value);
        }
        root.insert(format!("Section{}", section), Value::Object(settings));
    }
    Value::Object(root)
}
