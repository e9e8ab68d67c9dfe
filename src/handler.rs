use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::error::HandlerError;

/// Outcome of a custom input validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    /// Rejected with a message that is appended to the field error.
    InvalidWith(String),
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

impl From<&str> for Verdict {
    fn from(detail: &str) -> Self {
        Verdict::InvalidWith(detail.to_string())
    }
}

impl From<String> for Verdict {
    fn from(detail: String) -> Self {
        Verdict::InvalidWith(detail)
    }
}

// `None` passes, `Some(reason)` rejects
impl From<Option<String>> for Verdict {
    fn from(reason: Option<String>) -> Self {
        match reason {
            None => Verdict::Valid,
            Some(detail) => Verdict::InvalidWith(detail),
        }
    }
}

impl From<Value> for Verdict {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(true) => Verdict::Valid,
            Value::Bool(false) | Value::Null => Verdict::Invalid,
            Value::String(detail) => Verdict::InvalidWith(detail),
            other => Verdict::InvalidWith(other.to_string()),
        }
    }
}

pub type ValidatorFn =
    Arc<dyn Fn(Value, Map<String, Value>) -> BoxFuture<'static, Verdict> + Send + Sync>;

/// Declared input of a handler. Only declared inputs survive validation.
#[derive(Clone, Default)]
pub struct InputField {
    pub type_of: Option<String>,
    pub required: bool,
    pub description: Option<String>,
    pub validate: Option<ValidatorFn>,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type description in the type-check grammar, e.g. `String` or `{id: Number, ...}`.
    pub fn type_of(mut self, description: impl Into<String>) -> Self {
        self.type_of = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Synchronous validator; receives the value and every accepted parameter.
    pub fn validate<F, V>(mut self, check: F) -> Self
    where
        F: Fn(&Value, &Map<String, Value>) -> V + Send + Sync + 'static,
        V: Into<Verdict>,
    {
        self.validate = Some(Arc::new(move |value: Value, all: Map<String, Value>| {
            let verdict: Verdict = check(&value, &all).into();
            futures::future::ready(verdict).boxed()
        }));
        self
    }

    pub fn validate_async<F, Fut, V>(mut self, check: F) -> Self
    where
        F: Fn(Value, Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
        V: Into<Verdict> + 'static,
    {
        self.validate = Some(Arc::new(move |value: Value, all: Map<String, Value>| {
            check(value, all).map(Into::<Verdict>::into).boxed()
        }));
        self
    }
}

impl fmt::Debug for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputField")
            .field("type_of", &self.type_of)
            .field("required", &self.required)
            .field("description", &self.description)
            .field("validate", &self.validate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Static description of a handler: documentation, declared inputs,
/// response shaping and deployment settings.
#[derive(Debug, Clone, Default)]
pub struct HandlerDefinition {
    pub name: Option<String>,
    pub description: Option<String>,
    pub inputs: IndexMap<String, InputField>,
    pub skip_response: bool,
    pub merge_result: bool,
    pub response_headers: IndexMap<String, String>,
    pub warmup: bool,
    pub timeout: Option<u32>,
    pub memory_size: Option<u32>,
    pub events: Vec<Value>,
    /// Anything else the deployment tooling should see.
    pub extra: Map<String, Value>,
}

impl HandlerDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn input(mut self, name: impl Into<String>, field: InputField) -> Self {
        self.inputs.insert(name.into(), field);
        self
    }

    pub fn skip_response(mut self) -> Self {
        self.skip_response = true;
        self
    }

    pub fn merge_result(mut self) -> Self {
        self.merge_result = true;
        self
    }

    pub fn response_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response_headers.insert(name.into(), value.into());
        self
    }

    pub fn warmup(mut self) -> Self {
        self.warmup = true;
        self
    }

    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn memory_size(mut self, megabytes: u32) -> Self {
        self.memory_size = Some(megabytes);
        self
    }

    pub fn event(mut self, event: Value) -> Self {
        self.events.push(event);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

pub type Outcome = Result<Value, HandlerError>;

/// Completion callback of one invocation. The first outcome recorded wins;
/// later attempts are ignored.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    slot: Arc<Mutex<Option<Outcome>>>,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome; returns false if the invocation was already completed.
    pub fn complete(&self, outcome: Outcome) -> bool {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        true
    }

    pub fn succeed(&self, value: Value) -> bool {
        self.complete(Ok(value))
    }

    pub fn fail(&self, error: HandlerError) -> bool {
        self.complete(Err(error))
    }

    pub fn is_completed(&self) -> bool {
        match self.slot.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    pub(crate) fn take(&self) -> Option<Outcome> {
        match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// User logic plugged into the pipeline.
#[async_trait]
pub trait Handler: Send + Sync {
    fn definition(&self) -> &HandlerDefinition;

    // Runs after validation, e.g. to load a session into the context extensions
    async fn preprocess(
        &self,
        _event: &Value,
        _ctx: &mut RequestContext,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Produces the result sent back to the caller. Handlers declared with
    /// `skip_response` answer through `completion` themselves.
    async fn process(
        &self,
        event: &Value,
        ctx: &mut RequestContext,
        completion: &Completion,
    ) -> Result<Value, HandlerError>;
}
