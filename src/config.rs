use std::env;
use std::sync::Arc;

use crate::log::{Log, NullLog, TracingLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Runtime settings read from the environment once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Suppresses pipeline logging (`LAMBDA_META_ENV=test`).
    pub quiet: bool,
    pub log_format: LogFormat,
    pub workers: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let quiet = var("LAMBDA_META_ENV").is_some_and(|value| value == "test");
        let log_format = match var("LAMBDA_META_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let workers = worker_count(var("WORKER_COUNT").as_deref());
        Self {
            quiet,
            log_format,
            workers,
        }
    }

    pub fn log(&self) -> Arc<dyn Log> {
        if self.quiet {
            Arc::new(NullLog)
        } else {
            Arc::new(TracingLog)
        }
    }
}

// Worker count from WORKER_COUNT or detected CPUs, clamped to 1-6
fn worker_count(configured: Option<&str>) -> usize {
    if let Some(count) = configured.and_then(|value| value.parse::<usize>().ok()) {
        return count.clamp(1, 6);
    }
    num_cpus::get().clamp(1, 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_text_logging() {
        let config = config(&[]);
        assert!(!config.quiet);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!((1..=6).contains(&config.workers));
    }

    #[test]
    fn test_environment_is_quiet() {
        let config = config(&[("LAMBDA_META_ENV", "test"), ("LAMBDA_META_LOG_FORMAT", "json")]);
        assert!(config.quiet);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn worker_count_is_clamped() {
        assert_eq!(config(&[("WORKER_COUNT", "64")]).workers, 6);
        assert_eq!(config(&[("WORKER_COUNT", "0")]).workers, 1);
        assert_eq!(config(&[("WORKER_COUNT", "3")]).workers, 3);
    }
}
