pub mod context;
pub mod env;
pub mod event;
pub mod fields;
pub mod record;
pub mod resource;

pub mod layer;
pub mod sink;

pub mod memory_sink;
pub mod noop_sink;
pub mod stdout_sink;

pub mod init;

pub use context::{AmbientContext, FixedTraceContext, NoTraceContext, ServiceMetadata, TraceContextProvider};
pub use event::{FieldValue, Level, LogEvent};
pub use record::{build_record, render_line, LogRecord, RecordError};
pub use resource::{parse_resource_attributes, ResourceAttributes};
