use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use ecs_log_layer::context::ServiceMetadata;
use ecs_log_layer::init::{init_json_logging_with_config, LayerConfig};
use ecs_log_layer::noop_sink::NoopSink;

fn main() {
    let metadata = Arc::new(ServiceMetadata::from_env("backend"));
    let config = LayerConfig {
        default_directive: "info".to_string(),
        enable_console_fmt: false,
    };
    if let Err(e) = init_json_logging_with_config(metadata, NoopSink, config) {
        eprintln!("failed to install logging: {}", e);
        return;
    }

    let n: u64 = 100_000;
    let start = Instant::now();

    let span = tracing::info_span!(
        "load",
        otel.trace_id = "4bf92f3577b34da6a3ce929d0e0e4736",
        otel.span_id = "00f067aa0ba902b7"
    );
    let _guard = span.enter();
    for i in 0..n {
        info!(iteration = i, key = "alpha", latency_ms = 7, "load test event");
    }

    let elapsed = start.elapsed();
    println!(
        "built and serialized {} records in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
