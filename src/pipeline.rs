//! Request lifecycle for one handler: extract, validate, preprocess,
//! process, then format the outcome.
//!
//! Any stage failure skips the remaining stages and is formatted as an
//! error response. Handlers declared with `skip_response` complete the
//! invocation themselves and the pipeline formats nothing for them.

use std::sync::Arc;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::HandlerError;
use crate::extract::extract_parameters;
use crate::handler::{Completion, Handler, HandlerDefinition, Outcome};
use crate::log::{Log, TracingLog};
use crate::respond::{respond_with_error, respond_with_success};
use crate::validate::validate_parameters;

/// `source` of keep-alive pings sent by serverless-plugin-warmup.
pub const WARMUP_SOURCE: &str = "serverless-plugin-warmup";
pub const WARMUP_REPLY: &str = "Lambda is warm!";

#[derive(Clone)]
pub struct Pipeline {
    handler: Arc<dyn Handler>,
    log: Arc<dyn Log>,
}

impl Pipeline {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            log: Arc::new(TracingLog),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn Log>) -> Self {
        self.log = log;
        self
    }

    pub fn definition(&self) -> &HandlerDefinition {
        self.handler.definition()
    }

    /// Runs one invocation and returns what was passed to the completion.
    pub async fn entry(&self, event: Value, ctx: RequestContext) -> Outcome {
        let completion = Completion::new();
        self.process_request(&event, ctx, &completion).await;
        match completion.take() {
            Some(outcome) => outcome,
            None => {
                self.log.info(
                    &format!(
                        "{}(): Handler returned without completing the invocation",
                        self.definition().display_name()
                    ),
                    None,
                );
                Ok(Value::Null)
            }
        }
    }

    pub async fn process_request(
        &self,
        event: &Value,
        mut ctx: RequestContext,
        completion: &Completion,
    ) {
        let definition = self.handler.definition();
        ctx.waits_for_empty_event_loop = false;
        let request_id = ctx.ensure_request_id().to_string();
        self.log.info(
            &format!(
                "{}(): Processing request {request_id}",
                definition.display_name()
            ),
            ctx.host_detail().as_ref(),
        );

        if is_warmup(event) {
            self.log.info("WarmUP Plugin - Lambda is warm!", None);
            completion.succeed(Value::from(WARMUP_REPLY));
            return;
        }

        match self.run_stages(event, &mut ctx, completion).await {
            Ok(result) if !definition.skip_response => {
                respond_with_success(definition, result, completion, self.log.as_ref())
            }
            Err(error) if !definition.skip_response => {
                respond_with_error(definition, &error, completion, self.log.as_ref())
            }
            Err(error) => self.log.error(&error),
            Ok(_) => {}
        }
    }

    async fn run_stages(
        &self,
        event: &Value,
        ctx: &mut RequestContext,
        completion: &Completion,
    ) -> Result<Value, HandlerError> {
        let definition = self.handler.definition();
        extract_parameters(event, ctx);
        validate_parameters(definition, ctx, self.log.as_ref()).await?;
        self.handler.preprocess(event, ctx).await?;
        self.handler.process(event, ctx, completion).await
    }
}

pub fn is_warmup(event: &Value) -> bool {
    event.get("source").and_then(Value::as_str) == Some(WARMUP_SOURCE)
}
