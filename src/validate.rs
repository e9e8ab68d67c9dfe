use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::error::ValidationError;
use crate::handler::{HandlerDefinition, InputField, Verdict};
use crate::log::Log;
use crate::typecheck::TypeSpec;

/// Checks the extracted parameters against the handler's declared inputs.
///
/// Declared inputs act as a whitelist: on success `ctx.params` is replaced by
/// the declared fields that were present, numeric strings coerced for
/// `Number` fields. Fields are checked concurrently and the first rejection
/// fails the whole request, leaving `ctx.params` untouched.
pub async fn validate_parameters(
    definition: &HandlerDefinition,
    ctx: &mut RequestContext,
    log: &dyn Log,
) -> Result<(), ValidationError> {
    log.info("Validating parameters", None);

    if definition.inputs.is_empty() {
        log.info("No inputs defined, skipping parameter validation", None);
        return Ok(());
    }

    // Validators see every accepted parameter with every Number field
    // already coerced, so filter and coerce before checking
    let accepted: Map<String, Value> = definition
        .inputs
        .iter()
        .filter_map(|(name, field)| {
            let value = ctx.params.get(name)?;
            Some((name.clone(), coerce_field(field, value)))
        })
        .collect();

    let checks = definition
        .inputs
        .iter()
        .map(|(name, field)| check_field(name, field, &accepted));
    let checked = try_join_all(checks).await?;

    let params: Map<String, Value> = checked.into_iter().flatten().collect();
    log.info("Validated parameters", Some(&Value::Object(params.clone())));
    ctx.params = params;
    Ok(())
}

async fn check_field(
    name: &str,
    field: &InputField,
    accepted: &Map<String, Value>,
) -> Result<Option<(String, Value)>, ValidationError> {
    let Some(value) = accepted.get(name) else {
        if field.required {
            return Err(ValidationError::MissingField {
                field: name.to_string(),
            });
        }
        return Ok(None);
    };

    if let Some(description) = &field.type_of {
        let spec =
            TypeSpec::parse(description).map_err(|error| ValidationError::BadTypeDescription {
                field: name.to_string(),
                description: description.clone(),
                reason: error.to_string(),
            })?;
        if !spec.matches(Some(value)) {
            return Err(ValidationError::WrongType {
                field: name.to_string(),
                expected: description.clone(),
            });
        }
    }

    if let Some(validate) = &field.validate {
        match validate(value.clone(), accepted.clone()).await {
            Verdict::Valid => {}
            Verdict::Invalid => {
                return Err(ValidationError::Rejected {
                    field: name.to_string(),
                })
            }
            Verdict::InvalidWith(detail) => {
                return Err(ValidationError::RejectedWith {
                    field: name.to_string(),
                    detail,
                })
            }
        }
    }

    Ok(Some((name.to_string(), value.clone())))
}

// Path and query parameters always arrive as strings
fn coerce_field(field: &InputField, value: &Value) -> Value {
    if field.type_of.as_deref() == Some("Number") {
        if let Some(coerced) = coerce_integer(value) {
            return coerced;
        }
    }
    value.clone()
}

/// Integer for a string whose numeric value equals its base-10 integer
/// prefix: `"42"` and `"10.0"` coerce, `"4.5"`, `"4a"` and `"1e3"` do not.
/// Integers past the `i64` range come back as floats.
pub fn coerce_integer(value: &Value) -> Option<Value> {
    let Value::String(text) = value else {
        return None;
    };
    let number = numeric_value(text)?;
    let (negative, digits) = integer_prefix(text)?;

    if let Ok(magnitude) = digits.parse::<i64>() {
        let prefix = if negative { -magnitude } else { magnitude };
        return (prefix as f64 == number).then(|| Value::from(prefix));
    }

    let magnitude = digits.parse::<f64>().ok()?;
    let prefix = if negative { -magnitude } else { magnitude };
    (prefix == number).then(|| Value::from(prefix))
}

fn numeric_value(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    // Rust accepts "inf"/"nan" spellings that are not plain decimals
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
}

// Sign and leading digits, e.g. "-12abc" -> (true, "12")
fn integer_prefix(text: &str) -> Option<(bool, &str)> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: &str = &digits[..digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len())];
    if digits.is_empty() {
        return None;
    }
    Some((negative, digits))
}
