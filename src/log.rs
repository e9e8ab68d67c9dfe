use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::error::HandlerError;

/// Logging capability handed to the pipeline. Implementations must not fail.
pub trait Log: Send + Sync {
    fn info(&self, message: &str, detail: Option<&Value>);
    fn error(&self, error: &HandlerError);
}

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn info(&self, message: &str, detail: Option<&Value>) {
        match detail {
            Some(detail) => tracing::info!(detail = %detail, "{message}"),
            None => tracing::info!("{message}"),
        }
    }

    fn error(&self, error: &HandlerError) {
        tracing::error!(
            code = error.name(),
            status = error.status_code(),
            "{}",
            error.message()
        );
    }
}

/// Discards everything; used when running under test.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl Log for NullLog {
    fn info(&self, _message: &str, _detail: Option<&Value>) {}

    fn error(&self, _error: &HandlerError) {}
}

// Safe to call more than once; later calls keep the first subscriber
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_target(false),
            )
            .try_init(),
    };
}
