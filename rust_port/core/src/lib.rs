//! Core contracts shared by the Arctic Dash environment crates.
//! ToolCall in, Observation out; Snapshot for checkpoints; a name-keyed
//! registry of environment factories used by the service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Canonical tool call: tool name and JSON-serializable arguments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Json,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: Json) -> Self {
        Self { tool: tool.into(), args }
    }
}

/// Observation contract. Enforces presence of terminated/truncated; additional fields live in `data`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub terminated: bool,
    pub truncated: bool,
    /// Per-environment fields (state_index, map_text, reward_last, ...).
    #[serde(default)]
    pub data: Json,
}

/// Snapshot contract for checkpoints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    pub engine: String,
    pub data: Json,
}

/// Environment errors mapped to HTTP responses by services.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Async environment trait implemented by every adapter.
#[async_trait]
pub trait Environment: Send + Sync {
    async fn initialize(&mut self) -> Result<Observation, EngineError>;
    async fn step(&mut self, tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError>;
    async fn checkpoint(&self) -> Result<Snapshot, EngineError>;
    async fn terminate(&mut self) -> Result<Observation, EngineError>;
}

/// Only the first call of a batch is honoured.
pub fn first_call(tool_calls: &[ToolCall]) -> Result<&ToolCall, EngineError> {
    tool_calls.first().ok_or_else(|| EngineError::Validation("no tool_calls provided".into()))
}

/// Deserialize an optional JSON config, falling back to `Default`.
pub fn parse_config<T>(config: Option<Json>) -> Result<T, EngineError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match config {
        Some(Json::Null) | None => Ok(T::default()),
        Some(v) => serde_json::from_value(v).map_err(|e| EngineError::Validation(format!("bad config: {e}"))),
    }
}

// ---------------------------------
// Environment factory + registry
// ---------------------------------

/// Config-aware factory for constructing environment instances.
pub type EnvConfigFactory = Arc<dyn Fn(Option<Json>) -> Result<Box<dyn Environment>, EngineError> + Send + Sync + 'static>;

static ENV_REGISTRY: OnceLock<Mutex<HashMap<String, EnvConfigFactory>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, EnvConfigFactory>> {
    ENV_REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a config-aware environment factory under a unique name. Re-registering replaces.
pub fn register_environment_with_config(name: &str, factory: EnvConfigFactory) {
    // A poisoned lock only means another registration panicked; the map itself is intact.
    let mut reg = registry().lock().unwrap_or_else(|p| p.into_inner());
    reg.insert(name.to_string(), factory);
}

/// Instantiate a registered environment by name with optional JSON config.
pub fn create_environment_with_config(name: &str, config: Option<Json>) -> Result<Box<dyn Environment>, EngineError> {
    let factory = {
        let reg = registry().lock().map_err(|_| EngineError::Internal("env registry poisoned".into()))?;
        reg.get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("unsupported environment: {name}")))?
    };
    factory(config)
}

pub fn create_environment(name: &str) -> Result<Box<dyn Environment>, EngineError> {
    create_environment_with_config(name, None)
}

/// Registered environment names, sorted.
pub fn list_environments() -> Vec<String> {
    let mut names: Vec<String> = registry()
        .lock()
        .map(|reg| reg.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}
