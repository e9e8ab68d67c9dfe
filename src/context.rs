use indexmap::IndexMap;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Per-invocation state threaded through every pipeline stage. Owned by a
/// single invocation and dropped when it completes.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub params: Map<String, Value>,
    /// Header names are lower-cased on extraction.
    pub headers: IndexMap<String, String>,
    pub request_id: String,
    pub invoked_function_arn: Option<String>,
    pub deadline_ms: Option<u64>,
    pub waits_for_empty_event_loop: bool,
    /// Free-form values a preprocessing step hands to `process` (sessions etc).
    pub extensions: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    // Host runtimes invoked directly may not hand out an id
    pub fn ensure_request_id(&mut self) -> &str {
        if self.request_id.is_empty() {
            self.request_id = Uuid::new_v4().to_string();
        }
        &self.request_id
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Invocation details supplied by the host, if any.
    pub fn host_detail(&self) -> Option<Value> {
        let mut detail = Map::new();
        if let Some(arn) = &self.invoked_function_arn {
            detail.insert("functionArn".to_string(), Value::from(arn.as_str()));
        }
        if let Some(deadline) = self.deadline_ms {
            detail.insert("deadlineMs".to_string(), Value::from(deadline));
        }
        (!detail.is_empty()).then_some(Value::Object(detail))
    }
}

impl From<&lambda_runtime::Context> for RequestContext {
    fn from(context: &lambda_runtime::Context) -> Self {
        Self {
            request_id: context.request_id.clone(),
            invoked_function_arn: Some(context.invoked_function_arn.clone())
                .filter(|arn| !arn.is_empty()),
            deadline_ms: Some(context.deadline).filter(|deadline| *deadline > 0),
            // Lambda hosts default this to true; the pipeline turns it off
            waits_for_empty_event_loop: true,
            ..Self::default()
        }
    }
}
