use arctic_core::{
    first_call, parse_config, register_environment_with_config, EngineError, Environment, Observation, Snapshot,
    ToolCall,
};
use arctic_dash_rs::{preset_map, Action, ArcticDash, DashError, Env, EnvConfig, GridMap, RewardConfig, DEFAULT_MAP};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use std::sync::Arc;
use tracing::debug;

pub const ENV_NAME: &str = "ArcticDash";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset layout name (e0, e1, e2, e3, e5). Ignored when `desc` is given.
    pub map_name: Option<String>,
    /// Explicit map rows over S/G/F/H/W/V.
    pub desc: Option<Vec<String>>,
    pub max_jumps: Option<u32>,
    pub goal_reward: Option<f64>,
    pub pickup_reward: Option<f64>,
    pub hole_penalty: Option<f64>,
    pub move_cost: Option<f64>,
    pub jump_cost: Option<f64>,
    /// Accepted for parity with seeded environments; transitions are deterministic.
    pub seed: Option<u64>,
}

impl Config {
    fn env_config(&self) -> EnvConfig {
        let d = EnvConfig::default();
        EnvConfig {
            rewards: RewardConfig {
                move_cost: self.move_cost.unwrap_or(d.rewards.move_cost),
                jump_cost: self.jump_cost.unwrap_or(d.rewards.jump_cost),
                hole_penalty: self.hole_penalty.unwrap_or(d.rewards.hole_penalty),
                pickup_reward: self.pickup_reward.unwrap_or(d.rewards.pickup_reward),
                goal_reward: self.goal_reward.unwrap_or(d.rewards.goal_reward),
            },
            max_jumps: self.max_jumps.unwrap_or(d.max_jumps),
        }
    }

    fn grid(&self) -> Result<GridMap, DashError> {
        match (&self.desc, &self.map_name) {
            (Some(rows), _) => GridMap::parse(rows.as_slice()),
            (None, Some(name)) => preset_map(name),
            (None, None) => preset_map(DEFAULT_MAP),
        }
    }
}

fn map_dash_err(err: DashError) -> EngineError {
    EngineError::Validation(err.to_string())
}

fn action_code(v: &Json) -> Result<i64, EngineError> {
    v.as_i64().ok_or_else(|| EngineError::Validation(format!("action must be an integer, got {v}")))
}

pub struct ArcticDashEnvironment {
    env: ArcticDash,
    seed: Option<u64>,
}

impl ArcticDashEnvironment {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let grid = config.grid().map_err(map_dash_err)?;
        let mut env = ArcticDash::new(grid, config.env_config());
        env.reset(config.seed);
        Ok(Self { env, seed: config.seed })
    }

    pub fn engine(&self) -> &ArcticDash {
        &self.env
    }

    fn snapshot_obs(&self, event: &str) -> Observation {
        let agent = self.env.agent();
        let terminated = self.env.is_terminated();
        let public = json!({
            "state_index": self.env.state_index(),
            "position": [agent.position.0, agent.position.1],
            "jumps_left": agent.jumps_left,
            "max_jumps": self.env.config().max_jumps,
            "has_treasure": agent.has_treasure,
            "last_action": agent.last_action.map(|a| a.code()),
            "terminal_reason": self.env.terminal_reason().map(|r| r.as_str()),
            "error": self.env.last_info().error,
            "map_text": self.env.map_state().grid_text(),
            "path_taken": agent.path_taken,
            "terminated": terminated,
            "truncated": false,
            "reward_last": self.env.reward_last(),
            "total_reward": self.env.total_reward(),
            "event": event,
        });
        Observation { terminated, truncated: false, data: public }
    }

    /// Apply codes in order, stopping at the first terminal step. All codes are
    /// validated before any is applied.
    fn apply_codes(&mut self, codes: &[i64]) -> Result<(), EngineError> {
        let actions = codes
            .iter()
            .map(|&c| Action::from_code(c))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_dash_err)?;
        for action in actions {
            if self.env.step(action).terminated {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Environment for ArcticDashEnvironment {
    async fn initialize(&mut self) -> Result<Observation, EngineError> {
        Ok(self.snapshot_obs("initialize"))
    }

    async fn step(&mut self, tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError> {
        let call = first_call(&tool_calls)?;
        match call.tool.as_str() {
            "interact" | "move" => {
                let args = &call.args;
                let codes = if let Some(a) = args.get("action") {
                    vec![action_code(a)?]
                } else if let Some(arr) = args.get("actions").and_then(|v| v.as_array()) {
                    arr.iter().map(action_code).collect::<Result<Vec<_>, _>>()?
                } else {
                    return Err(EngineError::Validation("missing 'action' or 'actions'".into()));
                };
                self.apply_codes(&codes)?;
                Ok(self.snapshot_obs("step"))
            }
            "reset" => {
                self.env.reset(self.seed);
                Ok(self.snapshot_obs("reset"))
            }
            _ => Err(EngineError::Validation(format!("unknown tool: {}", call.tool))),
        }
    }

    async fn checkpoint(&self) -> Result<Snapshot, EngineError> {
        let data = serde_json::to_value(&self.env).map_err(|e| EngineError::Internal(e.to_string()))?;
        Ok(Snapshot { version: 1, engine: "arctic_dash".into(), data })
    }

    async fn terminate(&mut self) -> Result<Observation, EngineError> {
        self.env.close();
        let mut obs = self.snapshot_obs("terminate");
        // An episode cut short from outside is truncated, not terminated.
        obs.truncated = !obs.terminated;
        if let Some(map) = obs.data.as_object_mut() {
            map.insert("truncated".into(), Json::Bool(obs.truncated));
        }
        Ok(obs)
    }
}

pub fn register_default_env() {
    register_environment_with_config(
        ENV_NAME,
        Arc::new(|cfg: Option<Json>| -> Result<Box<dyn Environment>, EngineError> {
            let cfg: Config = parse_config(cfg)?;
            debug!(map = cfg.map_name.as_deref().unwrap_or(DEFAULT_MAP), custom = cfg.desc.is_some(), "creating environment");
            Ok(Box::new(ArcticDashEnvironment::new(cfg)?))
        }),
    );
}
