use std::{collections::HashMap, sync::Arc, sync::atomic::{AtomicU64, Ordering}};

use arctic_core::{create_environment_with_config, list_environments, Environment, EngineError, Observation, Snapshot, ToolCall};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

type SharedEnv = Arc<Mutex<Box<dyn Environment>>>;

/// Live environments keyed by id. The map lock is only held to look up,
/// insert or remove an entry; each environment has its own mutex, so steps on
/// different ids run concurrently and one id is never stepped twice at once.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<HashMap<String, SharedEnv>>>,
    id_ctr: Arc<AtomicU64>,
}

impl AppState {
    fn new() -> Self {
        Self { store: Arc::new(RwLock::new(HashMap::new())), id_ctr: Arc::new(AtomicU64::new(1)) }
    }
    fn next_id(&self) -> String { format!("env-{}", self.id_ctr.fetch_add(1, Ordering::Relaxed)) }

    async fn get(&self, env_id: &str) -> Result<SharedEnv, ApiError> {
        self.store.read().await.get(env_id).cloned().ok_or_else(|| not_found(env_id))
    }
}

#[derive(Deserialize)]
pub struct InitRequest {
    pub env_type: String,
    #[serde(default)]
    pub config: Option<JsonValue>,
}

#[derive(Serialize)]
pub struct InitResponse {
    pub env_id: String,
    pub observation: Observation,
}

#[derive(Deserialize)]
pub struct StepRequest {
    pub env_id: String,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
pub struct IdRequest { pub env_id: String }

type ApiError = (StatusCode, String);

async fn list_envs() -> impl IntoResponse { Json(list_environments()) }

#[axum::debug_handler]
async fn initialize(State(state): State<AppState>, Json(req): Json<InitRequest>) -> Result<Json<InitResponse>, ApiError> {
    let mut env = create_environment_with_config(&req.env_type, req.config).map_err(map_engine_err)?;
    let obs = env.initialize().await.map_err(map_engine_err)?;
    let id = state.next_id();
    info!(env_id = %id, env_type = %req.env_type, "environment initialized");
    state.store.write().await.insert(id.clone(), Arc::new(Mutex::new(env)));
    Ok(Json(InitResponse { env_id: id, observation: obs }))
}

#[axum::debug_handler]
async fn step(State(state): State<AppState>, Json(req): Json<StepRequest>) -> Result<Json<Observation>, ApiError> {
    let env = state.get(&req.env_id).await?;
    let obs = env.lock().await.step(req.tool_calls).await.map_err(map_engine_err)?;
    if obs.terminated {
        debug!(env_id = %req.env_id, "episode terminated");
    }
    Ok(Json(obs))
}

#[axum::debug_handler]
async fn checkpoint(State(state): State<AppState>, Json(req): Json<IdRequest>) -> Result<Json<Snapshot>, ApiError> {
    let env = state.get(&req.env_id).await?;
    let snap = env.lock().await.checkpoint().await.map_err(map_engine_err)?;
    Ok(Json(snap))
}

#[axum::debug_handler]
async fn terminate(State(state): State<AppState>, Json(req): Json<IdRequest>) -> Result<Json<Observation>, ApiError> {
    let env = state.store.write().await.remove(&req.env_id).ok_or_else(|| not_found(&req.env_id))?;
    let obs = env.lock().await.terminate().await.map_err(map_engine_err)?;
    info!(env_id = %req.env_id, "environment terminated");
    Ok(Json(obs))
}

fn not_found(env_id: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("env {env_id} not found"))
}

fn map_engine_err(err: EngineError) -> ApiError {
    warn!(error = %err, "engine error");
    match err {
        EngineError::Validation(s) => (StatusCode::BAD_REQUEST, s),
        EngineError::NotFound(s) => (StatusCode::NOT_FOUND, s),
        EngineError::Internal(s) => (StatusCode::INTERNAL_SERVER_ERROR, s),
    }
}

pub fn make_app() -> Router {
    let state = AppState::new();
    Router::new()
        .route("/envs", get(list_envs))
        .route("/initialize", post(initialize))
        .route("/step", post(step))
        .route("/checkpoint", post(checkpoint))
        .route("/terminate", post(terminate))
        .with_state(state)
}
