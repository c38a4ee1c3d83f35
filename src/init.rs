use crate::context::ServiceMetadata;
use crate::layer::JsonLogLayer;
use crate::sink::LogSink;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Settings for the installed subscriber.
///
/// **Fields**
/// - `default_directive`: `EnvFilter` directive used when `RUST_LOG` is
///   unset or invalid.
/// - `enable_console_fmt`: if `true`, a human-readable `fmt` layer is
///   stacked next to the JSON layer (writes to stderr so the JSON stream
///   on stdout stays clean).
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub default_directive: String,
    pub enable_console_fmt: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            enable_console_fmt: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("invalid log filter directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Install `Registry + EnvFilter + JsonLogLayer` as the global default
/// subscriber.
///
/// **Parameters**
/// - `metadata`: the process's service description, usually
///   [`ServiceMetadata::from_env`].
/// - `sink`: where finished JSON lines go.
/// - `config`: filter and console settings.
///
/// **Returns**
/// - `Err(InitError::AlreadyInstalled)` if another subscriber was set
///   first; the process keeps running with that one.
pub fn init_json_logging_with_config<K>(
    metadata: Arc<ServiceMetadata>,
    sink: K,
    config: LayerConfig,
) -> Result<(), InitError>
where
    K: LogSink + 'static,
{
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_directive)?,
    };
    let layer = JsonLogLayer::new(metadata, sink);

    // Two shapes so the layer stack types line up.
    if config.enable_console_fmt {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        Registry::default()
            .with(filter)
            .with(layer)
            .with(fmt_layer)
            .try_init()?;
    } else {
        Registry::default().with(filter).with(layer).try_init()?;
    }
    Ok(())
}

/// Install the JSON layer with [`LayerConfig::default`].
pub fn init_json_logging<K>(metadata: Arc<ServiceMetadata>, sink: K) -> Result<(), InitError>
where
    K: LogSink + 'static,
{
    init_json_logging_with_config(metadata, sink, LayerConfig::default())
}
