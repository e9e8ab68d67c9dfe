use async_trait::async_trait;
use lambda_meta::lambda::serve;
use lambda_meta::{
    Completion, Handler, HandlerDefinition, HandlerError, InputField, RequestContext, Verdict,
};
use lambda_runtime::Error;
use serde_json::{json, Value};

// Looks up a user by id; the id may arrive in the path, query string or body
struct GetUser {
    definition: HandlerDefinition,
}

impl GetUser {
    fn new() -> Self {
        let definition = HandlerDefinition::new("getUser")
            .description("Fetch a user record by id.")
            .event(json!({"http": {"path": "users/{userId}", "method": "get", "cors": true}}))
            .warmup()
            .response_header("Access-Control-Allow-Origin", "*")
            .input(
                "userId",
                InputField::new()
                    .required()
                    .type_of("String")
                    .description("36 character user id.")
                    .validate(|value, _| match value.as_str() {
                        Some(id) if id.len() == 36 => Verdict::Valid,
                        _ => Verdict::from("Must be exactly 36 characters."),
                    }),
            )
            .input(
                "verbose",
                InputField::new().type_of("Boolean").description("Include session details."),
            );
        Self { definition }
    }
}

#[async_trait]
impl Handler for GetUser {
    fn definition(&self) -> &HandlerDefinition {
        &self.definition
    }

    async fn preprocess(&self, _event: &Value, ctx: &mut RequestContext) -> Result<(), HandlerError> {
        let Some(token) = ctx.header("authorization").map(str::to_string) else {
            return Err(HandlerError::auth_required("Missing Authorization header"));
        };
        ctx.set_extension("session", json!({"token": token, "valid": true}));
        Ok(())
    }

    async fn process(
        &self,
        _event: &Value,
        ctx: &mut RequestContext,
        _completion: &Completion,
    ) -> Result<Value, HandlerError> {
        let user_id = ctx.param_str("userId").unwrap_or_default();
        let mut result = json!({ "userId": user_id, "requestId": ctx.request_id });
        if ctx.param("verbose") == Some(&json!(true)) {
            result["session"] = ctx.extension("session").cloned().unwrap_or(Value::Null);
        }
        Ok(result)
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(GetUser::new()).await
}
