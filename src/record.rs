use crate::context::{AmbientContext, ServiceMetadata};
use crate::event::{FieldValue, LogEvent};
use crate::fields::{self, FIXED_FIELDS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One normalized log line, ready to be serialized.
///
/// The twelve fixed fields come first, in schema order, followed by the
/// extension fields in the order the call site supplied them. A record is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

/// Error produced while turning an event into JSON.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("attribute `{key}` is not a finite number and has no JSON representation")]
    NonFiniteNumber { key: String },

    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LogRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys outside the fixed schema, in call-site order.
    pub fn extension_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|k| !fields::is_fixed_field(k))
    }

    /// Compact, single-line JSON without a trailing newline.
    pub fn to_json_line(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// `2024-05-01T12:30:45.123456Z`. The instant is taken as UTC as-is.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Effective `service.name` for `event`: a non-empty per-event override
/// wins over the process-wide name.
pub fn resolve_service_name<'a>(event: &'a LogEvent, metadata: &'a ServiceMetadata) -> &'a str {
    match event.attribute(fields::SERVICE_NAME_OVERRIDE) {
        Some(FieldValue::Str(name)) if !name.is_empty() => name.as_str(),
        _ => metadata.service_name.as_str(),
    }
}

/// Build the normalized record for `event` within `ctx`.
///
/// **Behavior**
/// - every fixed field is present; values that cannot be resolved are
///   `""` rather than missing;
/// - `event.dataset` is always `{service.name}.log`;
/// - an extension attribute is dropped when its key is already in the
///   record or is reserved (instrumentation prefix, bookkeeping
///   denylist); everything else is copied without coercion.
///
/// **Returns**
/// - `Err(RecordError::NonFiniteNumber)` if a kept attribute is a NaN or
///   infinite float. This is the only failure.
pub fn build_record(event: &LogEvent, ctx: &AmbientContext<'_>) -> Result<LogRecord, RecordError> {
    let metadata = ctx.metadata;
    let service_name = resolve_service_name(event, metadata);
    let resource = &metadata.resource;

    let mut out = Map::new();
    let mut put = |key: &str, value: &str| {
        out.insert(key.to_string(), Value::String(value.to_string()));
    };
    put(fields::TIMESTAMP, &format_timestamp(&event.timestamp));
    put(fields::LOG_LEVEL, event.level.as_str());
    put(fields::MESSAGE, &event.message);
    put(fields::LOGGER_NAME, &event.logger_name);
    put(fields::TRACE_ID, &ctx.trace_id);
    put(fields::SPAN_ID, &ctx.span_id);
    put(fields::SERVICE_NAME, service_name);
    put(fields::SERVICE_VERSION, resource.get_or_empty(fields::SERVICE_VERSION));
    put(fields::SERVICE_NAMESPACE, resource.get_or_empty(fields::SERVICE_NAMESPACE));
    put(fields::DEPLOYMENT_ENVIRONMENT, metadata.deployment_environment());
    put(fields::HOST_NAME, &metadata.host_name);
    put(fields::EVENT_DATASET, &format!("{service_name}.log"));
    debug_assert_eq!(out.len(), FIXED_FIELDS.len());

    for (key, value) in &event.attributes {
        if out.contains_key(key) || fields::is_reserved(key) {
            continue;
        }
        out.insert(key.clone(), to_json(key, value)?);
    }

    Ok(LogRecord { fields: out })
}

/// Build and serialize in one step.
pub fn render_line(event: &LogEvent, ctx: &AmbientContext<'_>) -> Result<String, RecordError> {
    build_record(event, ctx)?.to_json_line()
}

fn to_json(key: &str, value: &FieldValue) -> Result<Value, RecordError> {
    Ok(match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::I64(n) => Value::from(*n),
        FieldValue::U64(n) => Value::from(*n),
        FieldValue::F64(n) => Number::from_f64(*n)
            .map(Value::Number)
            .ok_or_else(|| RecordError::NonFiniteNumber { key: key.to_string() })?,
        FieldValue::Str(s) => Value::String(s.clone()),
        FieldValue::Json(v) => v.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FixedTraceContext;
    use crate::event::Level;
    use crate::resource::parse_resource_attributes;
    use chrono::TimeZone;

    fn metadata() -> ServiceMetadata {
        ServiceMetadata::new("backend")
            .with_resource(parse_resource_attributes(
                "service.version=1.2,service.namespace=demo,deployment.environment=prod",
            ))
            .with_host_name("node-1")
    }

    #[test]
    fn timestamp_has_microseconds_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(format_timestamp(&ts), "2024-05-01T12:30:45.123456Z");

        let whole = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&whole), "2024-05-01T00:00:00.000000Z");
    }

    #[test]
    fn fixed_fields_come_first_in_schema_order() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "hello").with_attribute("hits", 5);
        let record = build_record(&event, &AmbientContext::untraced(&meta)).unwrap();

        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(&keys[..12], &FIXED_FIELDS[..]);
        assert_eq!(keys[12], "hits");
        assert_eq!(record.get_str(fields::SERVICE_VERSION), Some("1.2"));
        assert_eq!(record.get_str(fields::SERVICE_NAMESPACE), Some("demo"));
        assert_eq!(record.get_str(fields::HOST_NAME), Some("node-1"));
    }

    #[test]
    fn missing_metadata_degrades_to_empty_strings() {
        let meta = ServiceMetadata::new("frontend");
        let event = LogEvent::new(Level::Debug, "frontend", "x");
        let record = build_record(&event, &AmbientContext::untraced(&meta)).unwrap();
        for key in [
            fields::TRACE_ID,
            fields::SPAN_ID,
            fields::SERVICE_VERSION,
            fields::SERVICE_NAMESPACE,
            fields::DEPLOYMENT_ENVIRONMENT,
            fields::HOST_NAME,
        ] {
            assert_eq!(record.get_str(key), Some(""), "{key}");
        }
        assert_eq!(record.len(), 12);
    }

    #[test]
    fn colliding_extension_never_overwrites_fixed_field() {
        let meta = metadata();
        let ctx = AmbientContext::capture(&meta, &FixedTraceContext::new("abc", "def"));
        let event = LogEvent::new(Level::Warning, "backend", "real message")
            .with_attribute("message", "spoofed")
            .with_attribute("trace.id", "spoofed")
            .with_attribute("event.dataset", "spoofed")
            .with_attribute("key", "alpha");
        let record = build_record(&event, &ctx).unwrap();

        assert_eq!(record.get_str("message"), Some("real message"));
        assert_eq!(record.get_str("trace.id"), Some("abc"));
        assert_eq!(record.get_str("event.dataset"), Some("backend.log"));
        assert_eq!(record.extension_keys().collect::<Vec<_>>(), ["key"]);
    }

    #[test]
    fn service_name_override_drives_dataset() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x")
            .with_attribute(fields::SERVICE_NAME_OVERRIDE, "backend-worker");
        let record = build_record(&event, &AmbientContext::untraced(&meta)).unwrap();
        assert_eq!(record.get_str("service.name"), Some("backend-worker"));
        assert_eq!(record.get_str("event.dataset"), Some("backend-worker.log"));
        assert!(record.get(fields::SERVICE_NAME_OVERRIDE).is_none());
    }

    #[test]
    fn empty_override_falls_back_to_process_name() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x")
            .with_attribute(fields::SERVICE_NAME_OVERRIDE, "");
        let record = build_record(&event, &AmbientContext::untraced(&meta)).unwrap();
        assert_eq!(record.get_str("service.name"), Some("backend"));
    }

    #[test]
    fn reserved_keys_are_dropped() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x")
            .with_attribute("lineno", 42)
            .with_attribute("otelSpanID", "abc")
            .with_attribute("log.module_path", "backend::items")
            .with_attribute("latency_ms", 7);
        let record = build_record(&event, &AmbientContext::untraced(&meta)).unwrap();
        assert_eq!(record.extension_keys().collect::<Vec<_>>(), ["latency_ms"]);
    }

    #[test]
    fn values_are_not_coerced() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x")
            .with_attribute("count", 5)
            .with_attribute("big", u64::MAX)
            .with_attribute("ratio", 0.5)
            .with_attribute("ok", true)
            .with_attribute("name", "alpha")
            .with_attribute("nested", serde_json::json!({"a": [1, 2]}))
            .with_attribute("nothing", FieldValue::Null);
        let record = build_record(&event, &AmbientContext::untraced(&meta)).unwrap();
        assert_eq!(record.get("count"), Some(&Value::from(5)));
        assert_eq!(record.get("big"), Some(&Value::from(u64::MAX)));
        assert_eq!(record.get("ratio"), Some(&Value::from(0.5)));
        assert_eq!(record.get("ok"), Some(&Value::Bool(true)));
        assert_eq!(record.get("name"), Some(&Value::from("alpha")));
        assert_eq!(record.get("nested"), Some(&serde_json::json!({"a": [1, 2]})));
        assert_eq!(record.get("nothing"), Some(&Value::Null));
    }

    #[test]
    fn non_finite_float_is_an_error() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x").with_attribute("ratio", f64::NAN);
        let err = build_record(&event, &AmbientContext::untraced(&meta)).unwrap_err();
        assert!(matches!(err, RecordError::NonFiniteNumber { ref key } if key == "ratio"));
    }

    #[test]
    fn reserved_non_finite_float_is_ignored() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x").with_attribute("otel.x", f64::NAN);
        assert!(build_record(&event, &AmbientContext::untraced(&meta)).is_ok());
    }

    #[test]
    fn json_line_is_compact() {
        let meta = metadata();
        let event = LogEvent::new(Level::Info, "backend", "x").with_attribute("k", "v");
        let line = render_line(&event, &AmbientContext::untraced(&meta)).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.starts_with("{\"@timestamp\":"));
        assert!(line.ends_with("\"k\":\"v\"}"));
    }
}
