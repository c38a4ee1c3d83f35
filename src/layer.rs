use crate::context::{AmbientContext, NoTraceContext, ServiceMetadata, TraceContextProvider};
use crate::event::{FieldValue, Level, LogEvent};
use crate::fields::{OTEL_SPAN_ID, OTEL_TRACE_ID, SERVICE_NAME_OVERRIDE};
use crate::record::render_line;
use crate::sink::LogSink;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Field the `log` -> `tracing` bridge uses for the original log target.
const LOG_TARGET: &str = "log.target";

/// `tracing_subscriber` layer that turns every event into one
/// trace-correlated JSON line and writes it to a [`LogSink`].
///
/// The record is built, serialized and written on the emitting thread,
/// in the same call; nothing is queued. Trace correlation is taken from
/// the event's own `otel.trace_id` / `otel.span_id` fields, else from the
/// nearest enclosing span that recorded them, else from the fallback
/// [`TraceContextProvider`].
///
/// Failures never propagate into the instrumented code: they are counted
/// in `failed_events` and reported on stderr.
pub struct JsonLogLayer<K> {
    sink: K,
    metadata: Arc<ServiceMetadata>,
    fallback: Arc<dyn TraceContextProvider>,
    /// Lines successfully handed to the sink.
    pub emitted_events: Arc<AtomicU64>,
    /// Events dropped because the record could not be built or written.
    pub failed_events: Arc<AtomicU64>,
}

impl<K: LogSink> JsonLogLayer<K> {
    /// Create a layer writing to `sink`, describing the service with
    /// `metadata`. Events outside any correlated span get empty ids.
    pub fn new(metadata: Arc<ServiceMetadata>, sink: K) -> Self {
        Self {
            sink,
            metadata,
            fallback: Arc::new(NoTraceContext),
            emitted_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Provider consulted when neither the event nor its spans carry ids.
    pub fn with_trace_provider(mut self, provider: Arc<dyn TraceContextProvider>) -> Self {
        self.fallback = provider;
        self
    }

    pub fn metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    fn emit(&self, event: &LogEvent, ctx: &AmbientContext<'_>) {
        let line = match render_line(event, ctx) {
            Ok(line) => line,
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("dropping log record from {}: {}", event.logger_name, e);
                return;
            }
        };

        if let Err(e) = self.sink.write_line(&line) {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("log sink write failed: {}", e);
            return;
        }
        self.emitted_events.fetch_add(1, Ordering::Relaxed);
    }
}

/// Correlation fields recorded on a span, stored in its extensions.
#[derive(Debug, Clone, Default)]
struct SpanCorrelation {
    trace_id: Option<String>,
    span_id: Option<String>,
    service_name: Option<String>,
}

impl SpanCorrelation {
    fn from_event(event: &LogEvent) -> Self {
        let text = |key: &str| match event.attribute(key) {
            Some(FieldValue::Str(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };
        SpanCorrelation {
            trace_id: text(OTEL_TRACE_ID),
            span_id: text(OTEL_SPAN_ID),
            service_name: text(SERVICE_NAME_OVERRIDE),
        }
    }

    fn is_empty(&self) -> bool {
        self.trace_id.is_none() && self.span_id.is_none() && self.service_name.is_none()
    }

    fn is_complete(&self) -> bool {
        self.trace_id.is_some() && self.span_id.is_some() && self.service_name.is_some()
    }

    /// Fill the gaps in `self` from an outer span.
    fn inherit(&mut self, outer: &SpanCorrelation) {
        if self.trace_id.is_none() {
            self.trace_id = outer.trace_id.clone();
        }
        if self.span_id.is_none() {
            self.span_id = outer.span_id.clone();
        }
        if self.service_name.is_none() {
            self.service_name = outer.service_name.clone();
        }
    }

    fn set(&mut self, field: &Field, value: String) {
        if value.is_empty() {
            return;
        }
        match field.name() {
            OTEL_TRACE_ID => self.trace_id = Some(value),
            OTEL_SPAN_ID => self.span_id = Some(value),
            SERVICE_NAME_OVERRIDE => self.service_name = Some(value),
            _ => {}
        }
    }
}

impl Visit for SpanCorrelation {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if matches!(field.name(), OTEL_TRACE_ID | OTEL_SPAN_ID | SERVICE_NAME_OVERRIDE) {
            self.set(field, format!("{:?}", value));
        }
    }
}

impl<S, K> Layer<S> for JsonLogLayer<K>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    K: LogSink + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut correlation = SpanCorrelation::default();
        attrs.record(&mut correlation);
        if correlation.is_empty() {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(correlation);
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(existing) = extensions.get_mut::<SpanCorrelation>() {
            values.record(existing);
            return;
        }
        let mut correlation = SpanCorrelation::default();
        values.record(&mut correlation);
        if !correlation.is_empty() {
            extensions.insert(correlation);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut log_event = LogEvent::new(
            Level::from(meta.level()),
            meta.target().replace("::", "."),
            String::new(),
        );
        event.record(&mut FieldVisitor { event: &mut log_event });

        let bridged_target = match log_event.attribute(LOG_TARGET) {
            Some(FieldValue::Str(target)) => Some(target.replace("::", ".")),
            _ => None,
        };
        if let Some(target) = bridged_target {
            log_event.logger_name = target;
        }

        let mut correlation = SpanCorrelation::from_event(&log_event);
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if correlation.is_complete() {
                    break;
                }
                if let Some(outer) = span.extensions().get::<SpanCorrelation>() {
                    correlation.inherit(outer);
                }
            }
        }

        if let Some(service_name) = correlation.service_name {
            log_event.set_attribute(SERVICE_NAME_OVERRIDE, service_name);
        }

        let ambient = AmbientContext {
            trace_id: correlation
                .trace_id
                .unwrap_or_else(|| self.fallback.current_trace_id()),
            span_id: correlation
                .span_id
                .unwrap_or_else(|| self.fallback.current_span_id()),
            metadata: &self.metadata,
        };
        self.emit(&log_event, &ambient);
    }
}

/// Collects an event's fields into a [`LogEvent`], keeping declaration
/// order and the native type of each value.
pub struct FieldVisitor<'a> {
    pub event: &'a mut LogEvent,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.event.message = value.to_string();
        } else {
            self.event.set_attribute(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.event.set_attribute(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.event.set_attribute(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.event.set_attribute(field.name(), value);
    }

    fn record_i128(&mut self, field: &Field, value: i128) {
        match i64::try_from(value) {
            Ok(n) => self.event.set_attribute(field.name(), n),
            Err(_) => self.event.set_attribute(field.name(), value.to_string()),
        }
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        match u64::try_from(value) {
            Ok(n) => self.event.set_attribute(field.name(), n),
            Err(_) => self.event.set_attribute(field.name(), value.to_string()),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.event.set_attribute(field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.event.message = format!("{:?}", value);
        } else {
            self.event.set_attribute(field.name(), format!("{:?}", value));
        }
    }
}
