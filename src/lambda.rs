use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

use crate::config::Config;
use crate::context::RequestContext;
use crate::handler::Handler;
use crate::log::init_tracing;
use crate::pipeline::Pipeline;

/// Cold-start entry: reads the environment, sets up logging and serves
/// `handler` through the pipeline until the runtime shuts down.
pub async fn serve(handler: impl Handler + 'static) -> Result<(), Error> {
    let config = Config::from_env();
    if !config.quiet {
        init_tracing(config.log_format);
    }
    run(Pipeline::new(handler).with_log(config.log())).await
}

pub async fn run(pipeline: Pipeline) -> Result<(), Error> {
    let pipeline = &pipeline;
    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| async move {
        handle_event(pipeline, event).await
    }))
    .await
}

// The formatter answers with a response value; only handlers that complete
// with an error themselves surface as invocation errors
pub async fn handle_event(pipeline: &Pipeline, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let ctx = RequestContext::from(&event.context);
    pipeline
        .entry(event.payload, ctx)
        .await
        .map_err(Error::from)
}
