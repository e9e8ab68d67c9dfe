//! Deployment metadata for a set of handlers.
//!
//! Handlers are described either by registering their definitions directly
//! or by JSON descriptor files found with a glob pattern. Each one becomes a
//! serverless.com-style function entry keyed by `prefix + name`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::handler::HandlerDefinition;

static INIT: Once = Once::new();

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list handlers: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed handler descriptor {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_of: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Static fields of a handler, as stored in descriptor files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandlerDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub inputs: IndexMap<String, InputDescriptor>,
    #[serde(default)]
    pub skip_response: bool,
    #[serde(default)]
    pub merge_result: bool,
    #[serde(default)]
    pub response_headers: IndexMap<String, String>,
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub memory_size: Option<u32>,
    #[serde(default)]
    pub warmup: bool,
    /// Any other deployment settings, copied through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&HandlerDefinition> for HandlerDescriptor {
    fn from(definition: &HandlerDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            events: definition.events.clone(),
            inputs: definition
                .inputs
                .iter()
                .map(|(name, field)| {
                    let input = InputDescriptor {
                        type_of: field.type_of.clone(),
                        required: field.required,
                        description: field.description.clone(),
                    };
                    (name.clone(), input)
                })
                .collect(),
            skip_response: definition.skip_response,
            merge_result: definition.merge_result,
            response_headers: definition.response_headers.clone(),
            timeout: definition.timeout,
            memory_size: definition.memory_size,
            warmup: definition.warmup,
            extra: definition.extra.clone(),
        }
    }
}

/// One function entry of the generated deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    /// `<relative path>.entry`
    pub handler: String,
    pub events: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, InputDescriptor>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_response: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub merge_result: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub response_headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub warmup: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

pub fn describe(path: &Path, descriptor: HandlerDescriptor) -> FunctionConfig {
    FunctionConfig {
        handler: entry_path(path),
        events: descriptor.events,
        name: descriptor.name,
        description: descriptor.description,
        inputs: descriptor.inputs,
        skip_response: descriptor.skip_response,
        merge_result: descriptor.merge_result,
        response_headers: descriptor.response_headers,
        timeout: descriptor.timeout.filter(|seconds| *seconds > 0),
        memory_size: descriptor.memory_size.filter(|megabytes| *megabytes > 0),
        warmup: descriptor.warmup,
        extra: descriptor.extra,
    }
}

/// Function entries for handlers registered in code, keyed by `prefix + name`.
pub fn enumerate<'a>(
    entries: impl IntoIterator<Item = (&'a Path, &'a HandlerDefinition)>,
    prefix: &str,
) -> IndexMap<String, FunctionConfig> {
    entries
        .into_iter()
        .map(|(path, definition)| {
            let key = function_key(prefix, definition.name.as_deref());
            (key, describe(path, HandlerDescriptor::from(definition)))
        })
        .collect()
}

/// Reads every descriptor file matching `pattern` and builds its entry.
/// Descriptors are parsed in parallel; directories are skipped.
pub fn scan(pattern: &str, prefix: &str) -> Result<IndexMap<String, FunctionConfig>, EnumerateError> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }

    let described: Vec<(String, FunctionConfig)> = paths
        .par_iter()
        .map(|path| {
            let descriptor = load_descriptor(path)?;
            let key = function_key(prefix, descriptor.name.as_deref());
            Ok((key, describe(path, descriptor)))
        })
        .collect::<Result<_, EnumerateError>>()?;

    Ok(described.into_iter().collect())
}

pub fn load_descriptor(path: &Path) -> Result<HandlerDescriptor, EnumerateError> {
    let text = std::fs::read_to_string(path).map_err(|source| EnumerateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EnumerateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// Initialize the rayon global pool used for scans (once per process)
pub fn init_thread_pool(workers: usize) {
    INIT.call_once(|| {
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global();
    });
}

fn function_key(prefix: &str, name: Option<&str>) -> String {
    format!("{prefix}{}", name.unwrap_or_default())
}

// "handlers/users.json" -> "handlers/users.entry", relative to the working directory
fn entry_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf());
    relative
        .with_extension("entry")
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::InputField;
    use serde_json::json;

    #[test]
    fn entry_paths_swap_the_extension() {
        assert_eq!(entry_path(Path::new("handlers/users.json")), "handlers/users.entry");
        assert_eq!(entry_path(Path::new("schedule")), "schedule.entry");
    }

    #[test]
    fn registered_definitions_are_described() {
        let custom = HandlerDefinition::new("customOptions")
            .description("Overrides some global settings.")
            .timeout(30)
            .memory_size(256);
        let gateway = HandlerDefinition::new("apiGateway")
            .event(json!({"http": {"path": "get/my/env", "method": "get", "cors": true}}))
            .input("userId", InputField::new().required().type_of("String"))
            .extra("reservedConcurrency", json!(5))
            .warmup();

        let functions = enumerate(
            [
                (Path::new("handlers/custom_options.rs"), &custom),
                (Path::new("handlers/api_gateway.rs"), &gateway),
            ],
            "v1-",
        );

        let custom = &functions["v1-customOptions"];
        assert_eq!(custom.handler, "handlers/custom_options.entry");
        assert_eq!(custom.timeout, Some(30));
        assert_eq!(custom.memory_size, Some(256));
        assert!(custom.events.is_empty());

        let gateway = serde_json::to_value(&functions["v1-apiGateway"]).expect("serializes");
        assert_eq!(gateway["events"][0]["http"]["method"], json!("get"));
        assert_eq!(gateway["inputs"]["userId"], json!({"type": "String", "required": true}));
        assert_eq!(gateway["warmup"], json!(true));
        assert!(gateway.get("timeout").is_none());
        assert!(gateway.get("skipResponse").is_none());
        assert_eq!(gateway["reservedConcurrency"], json!(5));
    }

    #[test]
    fn unnamed_handlers_use_the_bare_prefix() {
        let unnamed = HandlerDefinition::default();
        let functions = enumerate([(Path::new("noName.rs"), &unnamed)], "");
        assert!(functions.contains_key(""));
    }
}
