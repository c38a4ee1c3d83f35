use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ecs_log_layer::fields::FIXED_FIELDS;
use ecs_log_layer::{
    build_record, parse_resource_attributes, render_line, AmbientContext, FixedTraceContext, Level,
    LogEvent, ServiceMetadata,
};
use serde_json::Value;

fn backend() -> ServiceMetadata {
    ServiceMetadata::new("backend")
        .with_resource(parse_resource_attributes("deployment.environment=prod"))
}

#[test]
fn item_fetched_end_to_end() {
    let meta = backend();
    let ctx = AmbientContext::capture(&meta, &FixedTraceContext::new("abc123", "def456"));
    let event = LogEvent::new(Level::Info, "backend", "item fetched")
        .with_attribute("key", "alpha")
        .with_attribute("latency_ms", 7);

    let line = render_line(&event, &ctx).unwrap();

    for fragment in [
        "\"log.level\":\"INFO\"",
        "\"trace.id\":\"abc123\"",
        "\"span.id\":\"def456\"",
        "\"deployment.environment\":\"prod\"",
        "\"key\":\"alpha\"",
        "\"latency_ms\":7",
        "\"event.dataset\":\"backend.log\"",
    ] {
        assert!(line.contains(fragment), "missing {fragment} in {line}");
    }
}

#[test]
fn round_trip_keeps_fixed_schema_and_surviving_extensions() {
    let meta = backend();
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let event = LogEvent::new(Level::Error, "backend.items", "write failed")
        .at(ts)
        .with_attribute("key", "alpha")
        .with_attribute("attempt", 2)
        .with_attribute("host.name", "spoofed")
        .with_attribute("otel.kind", "server")
        .with_attribute("lineno", 10);
    let line = render_line(&event, &AmbientContext::untraced(&meta)).unwrap();

    let parsed: serde_json::Map<String, Value> = serde_json::from_str(&line).unwrap();
    let fixed: BTreeSet<&str> = FIXED_FIELDS.iter().copied().collect();
    let present_fixed: BTreeSet<&str> = parsed
        .keys()
        .map(String::as_str)
        .filter(|k| fixed.contains(k))
        .collect();
    assert_eq!(present_fixed, fixed);

    let extensions: Vec<&str> = parsed
        .keys()
        .map(String::as_str)
        .filter(|k| !fixed.contains(k))
        .collect();
    assert_eq!(extensions, ["key", "attempt"]);
    assert_eq!(parsed["@timestamp"], "2024-01-02T03:04:05.000000Z");
    assert_eq!(parsed["host.name"], "");
}

#[test]
fn untraced_records_have_empty_ids() {
    let meta = backend();
    let record = build_record(
        &LogEvent::new(Level::Info, "frontend", "frontend index"),
        &AmbientContext::untraced(&meta),
    )
    .unwrap();
    assert_eq!(record.get_str("trace.id"), Some(""));
    assert_eq!(record.get_str("span.id"), Some(""));
}

#[test]
fn dataset_always_follows_service_name() {
    let meta = backend();
    let ctx = AmbientContext::untraced(&meta);
    for override_name in [None, Some("frontend"), Some("backend-cron")] {
        let mut event = LogEvent::new(Level::Info, "backend", "tick");
        if let Some(name) = override_name {
            event.set_attribute("otel.service_name", name);
        }
        let record = build_record(&event, &ctx).unwrap();
        let service = record.get_str("service.name").unwrap();
        assert_eq!(record.get_str("event.dataset"), Some(format!("{service}.log").as_str()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_builds_do_not_share_extensions() {
    let meta = Arc::new(backend());

    let mut handles = Vec::with_capacity(100);
    for i in 0..100u64 {
        let meta = Arc::clone(&meta);
        handles.push(tokio::spawn(async move {
            let provider = FixedTraceContext::new(format!("trace-{i}"), format!("span-{i}"));
            let ctx = AmbientContext::capture(&meta, &provider);
            let event = LogEvent::new(Level::Info, "backend", format!("request {i}"))
                .with_attribute(format!("only_{i}"), i)
                .with_attribute("request", i);
            (i, render_line(&event, &ctx).unwrap())
        }));
    }

    for handle in handles {
        let (i, line) = handle.await.unwrap();
        let parsed: serde_json::Map<String, Value> = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], format!("request {i}"));
        assert_eq!(parsed["trace.id"], format!("trace-{i}"));
        assert_eq!(parsed["span.id"], format!("span-{i}"));
        assert_eq!(parsed["request"], i);
        assert_eq!(parsed[&format!("only_{i}")], i);
        assert_eq!(parsed.len(), FIXED_FIELDS.len() + 2);
    }
}
