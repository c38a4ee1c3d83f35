//! Field names of the emitted JSON schema.
//!
//! The twelve fixed fields are always present, in the order of
//! [`FIXED_FIELDS`]. Caller-supplied attributes become extension fields
//! unless they collide with a fixed field or are reserved (see
//! [`is_reserved`]).

pub const TIMESTAMP: &str = "@timestamp";
pub const LOG_LEVEL: &str = "log.level";
pub const MESSAGE: &str = "message";
pub const LOGGER_NAME: &str = "logger.name";

/// Hex trace id of the active span, `""` when none.
pub const TRACE_ID: &str = "trace.id";

/// Hex span id of the active span, `""` when none.
pub const SPAN_ID: &str = "span.id";

pub const SERVICE_NAME: &str = "service.name";
pub const SERVICE_VERSION: &str = "service.version";
pub const SERVICE_NAMESPACE: &str = "service.namespace";
pub const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";
pub const HOST_NAME: &str = "host.name";

/// Always `{service.name}.log`.
pub const EVENT_DATASET: &str = "event.dataset";

pub const FIXED_FIELDS: [&str; 12] = [
    TIMESTAMP,
    LOG_LEVEL,
    MESSAGE,
    LOGGER_NAME,
    TRACE_ID,
    SPAN_ID,
    SERVICE_NAME,
    SERVICE_VERSION,
    SERVICE_NAMESPACE,
    DEPLOYMENT_ENVIRONMENT,
    HOST_NAME,
    EVENT_DATASET,
];

// Instrumentation bookkeeping

/// Prefix of fields owned by tracing instrumentation (`otel.name`,
/// `otel.kind`, `otel.trace_id`, ...). Never emitted as extensions.
pub const RESERVED_PREFIX: &str = "otel";

/// Per-event override of `service.name`.
pub const SERVICE_NAME_OVERRIDE: &str = "otel.service_name";

/// Trace id recorded on a span or event by instrumentation.
pub const OTEL_TRACE_ID: &str = "otel.trace_id";

/// Span id recorded on a span or event by instrumentation.
pub const OTEL_SPAN_ID: &str = "otel.span_id";

/// Logging-record metadata that is noise rather than payload.
pub const DENYLIST: &[&str] = &[
    "args",
    "msg",
    "levelname",
    "levelno",
    "pathname",
    "filename",
    "module",
    "module_path",
    "file",
    "line",
    "lineno",
    "funcName",
    "exc_info",
    "exc_text",
    "stack_info",
    "created",
    "msecs",
    "relativeCreated",
    "thread",
    "threadName",
    "thread_id",
    "processName",
    "process",
    // attached by the `log` -> `tracing` bridge
    "log.target",
    "log.module_path",
    "log.file",
    "log.line",
];

pub fn is_fixed_field(key: &str) -> bool {
    FIXED_FIELDS.contains(&key)
}

/// Whether `key` must never appear as an extension field, independent of
/// what the record already contains.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX) || DENYLIST.contains(&key) || is_fixed_field(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fields_are_reserved() {
        for key in FIXED_FIELDS {
            assert!(is_reserved(key), "{key} should be reserved");
        }
    }

    #[test]
    fn instrumentation_prefix_is_reserved() {
        assert!(is_reserved("otel.service_name"));
        assert!(is_reserved("otelTraceID"));
        assert!(is_reserved("otel.kind"));
    }

    #[test]
    fn bookkeeping_is_reserved_but_payload_is_not() {
        assert!(is_reserved("lineno"));
        assert!(is_reserved("log.module_path"));
        assert!(!is_reserved("latency_ms"));
        assert!(!is_reserved("key"));
        assert!(!is_reserved("log.origin"));
    }
}
