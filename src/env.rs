//! Environment variable names read at startup to describe the service.
//!
//! These are purely helpers; the builder and layer take an explicit
//! [`ServiceMetadata`](crate::context::ServiceMetadata) and never touch
//! the environment themselves.

/// Static service name, e.g. `backend`.
pub const OTEL_SERVICE_NAME_ENV: &str = "OTEL_SERVICE_NAME";

/// Comma-separated `key=value` resource attributes, e.g.
/// `service.version=1.2,deployment.environment=prod`.
pub const OTEL_RESOURCE_ATTRIBUTES_ENV: &str = "OTEL_RESOURCE_ATTRIBUTES";

/// Host identifier emitted as `host.name`.
pub const HOSTNAME_ENV: &str = "HOSTNAME";

/// Deployment environment, used when the resource attributes carry none.
pub const DEPLOYMENT_ENV_ENV: &str = "DEPLOYMENT_ENV";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
