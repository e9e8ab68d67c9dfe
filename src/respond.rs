use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::HandlerError;
use crate::handler::{Completion, HandlerDefinition};
use crate::log::Log;

const STATUS_CODE_FIELD: &str = "responseHttpCode";

/// Proxy-integration response handed back to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
    pub headers: IndexMap<String, String>,
    pub body: String,
}

impl ApiGatewayResponse {
    fn new(definition: &HandlerDefinition, status_code: u16, envelope: Map<String, Value>) -> Self {
        Self {
            status_code,
            is_base64_encoded: false,
            headers: definition.response_headers.clone(),
            body: Value::Object(envelope).to_string(),
        }
    }

    pub fn into_value(self) -> Value {
        json!({
            "statusCode": self.status_code,
            "isBase64Encoded": self.is_base64_encoded,
            "headers": self.headers,
            "body": self.body,
        })
    }
}

/// Formats a successful result. A `responseHttpCode` field on an object
/// result becomes the status code and is dropped from the payload.
pub fn success_response(definition: &HandlerDefinition, mut result: Value) -> ApiGatewayResponse {
    let mut status_code = 200;
    if let Value::Object(fields) = &mut result {
        if let Some(code) = fields.shift_remove(STATUS_CODE_FIELD) {
            status_code = custom_status_code(&code).unwrap_or(status_code);
        }
    }

    let mut envelope = Map::new();
    envelope.insert("status".to_string(), json!("OK"));
    if definition.merge_result {
        if let Value::Object(fields) = result {
            envelope.extend(fields);
        }
    } else if !result.is_null() {
        envelope.insert("result".to_string(), result);
    }

    ApiGatewayResponse::new(definition, status_code, envelope)
}

pub fn error_response(definition: &HandlerDefinition, error: &HandlerError) -> ApiGatewayResponse {
    let mut envelope = Map::new();
    envelope.insert("status".to_string(), json!("ERROR"));
    envelope.insert("error".to_string(), json!(error.message()));
    envelope.insert("code".to_string(), json!(error.name()));
    ApiGatewayResponse::new(definition, error.status_code(), envelope)
}

pub fn respond_with_success(
    definition: &HandlerDefinition,
    result: Value,
    completion: &Completion,
    log: &dyn Log,
) {
    log.info("Success!", Some(&result));
    let response = success_response(definition, result);
    completion.succeed(response.into_value());
}

pub fn respond_with_error(
    definition: &HandlerDefinition,
    error: &HandlerError,
    completion: &Completion,
    log: &dyn Log,
) {
    log.error(error);
    let response = error_response(definition, error);
    completion.succeed(response.into_value());
}

// Zero or out-of-range codes fall back to the default
fn custom_status_code(code: &Value) -> Option<u16> {
    code.as_u64()
        .filter(|code| (100..=599).contains(code))
        .and_then(|code| u16::try_from(code).ok())
}
