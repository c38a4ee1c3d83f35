use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use ecs_log_layer::context::ServiceMetadata;
use ecs_log_layer::init::init_json_logging;
use ecs_log_layer::stdout_sink::StdoutSink;

/// Emits the kind of lines the demo backend writes for one item lookup.
///
/// Try it with
/// `OTEL_RESOURCE_ATTRIBUTES="service.version=1.2,deployment.environment=prod" HOSTNAME=$(hostname)`.
fn main() {
    let metadata = Arc::new(ServiceMetadata::from_env("backend"));
    if let Err(e) = init_json_logging(metadata, StdoutSink) {
        eprintln!("failed to install logging: {}", e);
        return;
    }

    info!(target: "backend", "starting service");

    let request = tracing::info_span!(
        "GET /api/items",
        otel.trace_id = "0af7651916cd43dd8448eb211c80319c",
        otel.span_id = "b7ad6b7169203331"
    );
    let _guard = request.enter();

    let start = Instant::now();
    let found = lookup("alpha");
    let latency_ms = start.elapsed().as_millis() as u64;
    match found {
        Some(_) => info!(target: "backend", key = "alpha", latency_ms, "item fetched"),
        None => warn!(target: "backend", key = "alpha", "item not found"),
    }

    // Colliding and reserved keys never reach the output.
    info!(
        target: "backend",
        lineno = 42,
        host.name = "spoofed",
        otel.kind = "server",
        "filtered fields"
    );
}

fn lookup(key: &str) -> Option<&'static str> {
    (key == "alpha").then_some("one")
}
