//! Collects request parameters from the places a trigger can put them.
//!
//! Stages run in a fixed order and merge key by key, so later sources win:
//! headers, the raw event, path parameters, the query string, then the body.
//! No stage fails; a source that cannot be read contributes nothing.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::context::RequestContext;

const QUERY_STRING: &str = "queryStringParameters";
const PATH_PARAMETERS: &str = "pathParameters";

pub fn extract_parameters(event: &Value, ctx: &mut RequestContext) {
    ctx.params = Map::new();
    ctx.headers = IndexMap::new();

    parse_headers(event, ctx);
    parse_raw_event(event, ctx);
    parse_path(event, ctx);
    parse_query_string(event, ctx);
    parse_body(event, ctx);
}

fn parse_headers(event: &Value, ctx: &mut RequestContext) {
    let Some(headers) = event.get("headers").and_then(Value::as_object) else {
        return;
    };
    for (name, value) in headers {
        let value = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => continue,
        };
        ctx.headers.insert(name.to_lowercase(), value);
    }
}

// Direct invocations send their parameters as the event itself
fn parse_raw_event(event: &Value, ctx: &mut RequestContext) {
    match event {
        Value::Object(fields)
            if !fields.contains_key(QUERY_STRING) && !fields.contains_key(PATH_PARAMETERS) =>
        {
            merge(ctx, fields);
        }
        Value::String(text) => merge_json_text(ctx, text),
        _ => {}
    }
}

fn parse_path(event: &Value, ctx: &mut RequestContext) {
    if let Some(Value::Object(fields)) = event.get(PATH_PARAMETERS) {
        merge(ctx, fields);
    }
}

// Runs after path parameters so the query string wins on collisions
fn parse_query_string(event: &Value, ctx: &mut RequestContext) {
    if let Some(Value::Object(fields)) = event.get(QUERY_STRING) {
        merge(ctx, fields);
    }
}

fn parse_body(event: &Value, ctx: &mut RequestContext) {
    if let Some(Value::String(body)) = event.get("body") {
        merge_json_text(ctx, body);
    }
}

fn merge_json_text(ctx: &mut RequestContext, text: &str) {
    if !text.starts_with('{') {
        return;
    }
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) {
        merge(ctx, &fields);
    }
}

fn merge(ctx: &mut RequestContext, fields: &Map<String, Value>) {
    for (key, value) in fields {
        ctx.params.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(event: Value) -> RequestContext {
        let mut ctx = RequestContext::new();
        extract_parameters(&event, &mut ctx);
        ctx
    }

    #[test]
    fn raw_object_events_become_parameters() {
        let ctx = extract(json!({"userId": "abc", "num": 3}));
        assert_eq!(ctx.params.get("userId"), Some(&json!("abc")));
        assert_eq!(ctx.params.get("num"), Some(&json!(3)));
    }

    #[test]
    fn json_string_events_are_decoded() {
        let ctx = extract(json!("{ \"userId\": \"abc\" }"));
        assert_eq!(ctx.param_str("userId"), Some("abc"));
    }

    #[test]
    fn undecodable_strings_add_nothing() {
        assert!(extract(json!("{ not json")).params.is_empty());
        assert!(extract(json!("userId=abc")).params.is_empty());
    }

    #[test]
    fn query_string_overrides_path_parameters() {
        let ctx = extract(json!({
            "pathParameters": {"a": 1, "b": "path"},
            "queryStringParameters": {"a": 2}
        }));
        assert_eq!(ctx.params.get("a"), Some(&json!(2)));
        assert_eq!(ctx.params.get("b"), Some(&json!("path")));
        // the gateway envelope itself is not treated as parameters
        assert!(ctx.params.get("pathParameters").is_none());
    }

    #[test]
    fn body_overrides_everything_before_it() {
        let ctx = extract(json!({
            "queryStringParameters": {"a": "query"},
            "body": "{\"a\": \"body\", \"c\": true}"
        }));
        assert_eq!(ctx.params.get("a"), Some(&json!("body")));
        assert_eq!(ctx.params.get("c"), Some(&json!(true)));
    }

    #[test]
    fn non_json_bodies_are_ignored() {
        let ctx = extract(json!({
            "queryStringParameters": {"a": "query"},
            "body": "a=form&b=encoded"
        }));
        assert_eq!(ctx.params.len(), 1);
    }

    #[test]
    fn header_names_are_lower_cased() {
        let ctx = extract(json!({
            "headers": {"Authorization": "Bearer XYZ", "X-Retry": 2},
            "pathParameters": {}
        }));
        assert_eq!(ctx.headers.get("authorization").map(String::as_str), Some("Bearer XYZ"));
        assert_eq!(ctx.header("x-retry"), Some("2"));
    }

    #[test]
    fn extraction_starts_from_an_empty_map() {
        let mut ctx = RequestContext::new();
        ctx.params.insert("stale".to_string(), json!(true));
        extract_parameters(&json!({"fresh": 1}), &mut ctx);
        assert!(ctx.params.get("stale").is_none());
        assert_eq!(ctx.params.get("fresh"), Some(&json!(1)));
    }
}
