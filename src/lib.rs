//! Request lifecycle wrapper for Lambda handlers.
//!
//! A [`Handler`] declares its inputs and response shape in a
//! [`HandlerDefinition`] and implements `process`. The [`Pipeline`] turns a
//! raw trigger event into a validated parameter map, runs the handler and
//! formats the result or error as an API Gateway proxy response.
//! [`enumerate`] produces deployment metadata from handler descriptors.

pub mod config;
pub mod context;
pub mod enumerate;
pub mod error;
pub mod extract;
pub mod handler;
pub mod lambda;
pub mod log;
pub mod pipeline;
pub mod respond;
pub mod typecheck;
pub mod validate;

pub use config::{Config, LogFormat};
pub use context::RequestContext;
pub use error::{ErrorKind, HandlerError, ValidationError};
pub use handler::{Completion, Handler, HandlerDefinition, InputField, Outcome, Verdict};
pub use log::{Log, NullLog, TracingLog};
pub use pipeline::{Pipeline, WARMUP_REPLY, WARMUP_SOURCE};
pub use respond::ApiGatewayResponse;
