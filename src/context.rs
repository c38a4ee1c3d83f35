use crate::env::{
    env_or, DEPLOYMENT_ENV_ENV, HOSTNAME_ENV, OTEL_RESOURCE_ATTRIBUTES_ENV, OTEL_SERVICE_NAME_ENV,
};
use crate::resource::{parse_resource_attributes, ResourceAttributes};

/// Source of the active trace correlation identifiers.
///
/// Implementations return an empty string when no span is active; they
/// must never fail.
pub trait TraceContextProvider: Send + Sync {
    fn current_trace_id(&self) -> String;
    fn current_span_id(&self) -> String;
}

/// Provider used when nothing is traced: both ids are always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTraceContext;

impl TraceContextProvider for NoTraceContext {
    fn current_trace_id(&self) -> String {
        String::new()
    }

    fn current_span_id(&self) -> String {
        String::new()
    }
}

/// Provider returning constant ids, for explicitly propagated context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedTraceContext {
    pub trace_id: String,
    pub span_id: String,
}

impl FixedTraceContext {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        FixedTraceContext {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
        }
    }
}

impl TraceContextProvider for FixedTraceContext {
    fn current_trace_id(&self) -> String {
        self.trace_id.clone()
    }

    fn current_span_id(&self) -> String {
        self.span_id.clone()
    }
}

/// Process-scoped description of the running service.
///
/// Built once at startup and read-only afterwards; share it behind an
/// `Arc` between the layer and any direct callers of the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMetadata {
    pub service_name: String,
    pub resource: ResourceAttributes,
    pub host_name: String,
    /// Used for `deployment.environment` only when the resource
    /// attributes do not carry one.
    pub deployment_environment: Option<String>,
}

impl ServiceMetadata {
    pub fn new(service_name: impl Into<String>) -> Self {
        ServiceMetadata {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_resource(mut self, resource: ResourceAttributes) -> Self {
        self.resource = resource;
        self
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = host_name.into();
        self
    }

    pub fn with_deployment_environment(mut self, environment: impl Into<String>) -> Self {
        self.deployment_environment = Some(environment.into());
        self
    }

    /// Read the service description from the process environment.
    ///
    /// **Parameters**
    /// - `default_service_name`: used when `OTEL_SERVICE_NAME` is unset.
    ///
    /// The resource attribute string is parsed here, once; malformed
    /// segments are dropped without any report.
    pub fn from_env(default_service_name: &str) -> Self {
        let deployment_environment = std::env::var(DEPLOYMENT_ENV_ENV)
            .ok()
            .filter(|v| !v.is_empty());
        ServiceMetadata {
            service_name: env_or(OTEL_SERVICE_NAME_ENV, default_service_name),
            resource: parse_resource_attributes(&env_or(OTEL_RESOURCE_ATTRIBUTES_ENV, "")),
            host_name: env_or(HOSTNAME_ENV, ""),
            deployment_environment,
        }
    }

    pub fn deployment_environment(&self) -> &str {
        match self.resource.get(crate::fields::DEPLOYMENT_ENVIRONMENT) {
            Some(env) => env,
            None => self.deployment_environment.as_deref().unwrap_or(""),
        }
    }
}

/// Everything the record builder needs besides the event itself: the
/// trace ids active at the time of the call plus the static metadata.
#[derive(Debug, Clone)]
pub struct AmbientContext<'a> {
    pub trace_id: String,
    pub span_id: String,
    pub metadata: &'a ServiceMetadata,
}

impl<'a> AmbientContext<'a> {
    /// Snapshot the provider's current ids alongside `metadata`.
    pub fn capture(metadata: &'a ServiceMetadata, provider: &dyn TraceContextProvider) -> Self {
        AmbientContext {
            trace_id: provider.current_trace_id(),
            span_id: provider.current_span_id(),
            metadata,
        }
    }

    /// Context with no active trace.
    pub fn untraced(metadata: &'a ServiceMetadata) -> Self {
        Self::capture(metadata, &NoTraceContext)
    }
}
