use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::engine::{resolve, AgentState, RewardConfig, TerminalReason};
use crate::error::DashError;
use crate::map::{GridMap, MapState};
use crate::preset::preset_map;

/// Gymnasium-style environment contract.
pub trait Env {
    type Obs;
    type Act;

    /// Start a new episode. The seed exists for parity with stochastic
    /// environments; deterministic implementations may ignore it.
    fn reset(&mut self, seed: Option<u64>) -> (Self::Obs, StepInfo);

    fn step(&mut self, action: Self::Act) -> Step<Self::Obs>;

    /// Release any held resources. Must be safe to call repeatedly.
    fn close(&mut self) {}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub probability: f64,
    pub jumps_left: u32,
    pub has_treasure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step<Obs> {
    pub observation: Obs,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub rewards: RewardConfig,
    pub max_jumps: u32,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self { rewards: RewardConfig::default(), max_jumps: 2 }
    }
}

/// Episode controller: owns the agent and the degradation overlay for one
/// episode at a time. Observations are state indices (`row * cols + col`).
///
/// Serializes the whole episode, terminal flag and last info included.
/// Deserializing checks the overlay and agent against the grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "EpisodeRecord")]
pub struct ArcticDash {
    grid: GridMap,
    config: EnvConfig,
    #[serde(rename = "map_state")]
    map: MapState,
    agent: AgentState,
    #[serde(rename = "terminal_reason")]
    terminal: Option<TerminalReason>,
    last_info: StepInfo,
    reward_last: f64,
    total_reward: f64,
}

#[derive(Deserialize)]
struct EpisodeRecord {
    grid: GridMap,
    config: EnvConfig,
    map_state: MapState,
    agent: AgentState,
    terminal_reason: Option<TerminalReason>,
    last_info: StepInfo,
    reward_last: f64,
    total_reward: f64,
}

impl TryFrom<EpisodeRecord> for ArcticDash {
    type Error = DashError;

    fn try_from(r: EpisodeRecord) -> Result<Self, Self::Error> {
        let (rows, cols) = (r.grid.rows(), r.grid.cols());
        if (r.map_state.rows(), r.map_state.cols()) != (rows, cols) {
            return Err(DashError::InvalidMap(format!(
                "map state is {}x{}, grid is {rows}x{cols}",
                r.map_state.rows(),
                r.map_state.cols()
            )));
        }
        for index in 0..r.grid.n_states() {
            let pos = (index / cols, index % cols);
            let original = r.grid.tile_at(pos);
            if original.is_landmark() != r.map_state.get(pos).is_landmark()
                || (original.is_landmark() && original != r.map_state.get(pos))
            {
                return Err(DashError::InvalidMap(format!("map state disagrees with grid landmarks at {pos:?}")));
            }
        }
        for &(row, col) in std::iter::once(&r.agent.position).chain(&r.agent.path_taken) {
            r.grid.tile(row, col)?;
        }
        Ok(Self {
            grid: r.grid,
            config: r.config,
            map: r.map_state,
            agent: r.agent,
            terminal: r.terminal_reason,
            last_info: r.last_info,
            reward_last: r.reward_last,
            total_reward: r.total_reward,
        })
    }
}

impl ArcticDash {
    pub fn new(grid: GridMap, config: EnvConfig) -> Self {
        let map = grid.fresh_state();
        let agent = AgentState::spawn(grid.start(), config.max_jumps);
        let last_info = StepInfo { probability: 1.0, jumps_left: agent.jumps_left, has_treasure: false, error: None };
        Self { grid, config, map, agent, terminal: None, last_info, reward_last: 0.0, total_reward: 0.0 }
    }

    pub fn from_rows<S: AsRef<str>>(desc: &[S], config: EnvConfig) -> Result<Self, DashError> {
        Ok(Self::new(GridMap::parse(desc)?, config))
    }

    pub fn from_preset(name: &str, config: EnvConfig) -> Result<Self, DashError> {
        Ok(Self::new(preset_map(name)?, config))
    }

    pub fn grid(&self) -> &GridMap { &self.grid }
    pub fn map_state(&self) -> &MapState { &self.map }
    pub fn agent(&self) -> &AgentState { &self.agent }
    pub fn config(&self) -> &EnvConfig { &self.config }
    pub fn terminal_reason(&self) -> Option<TerminalReason> { self.terminal }
    pub fn is_terminated(&self) -> bool { self.terminal.is_some() }
    pub fn last_info(&self) -> &StepInfo { &self.last_info }
    pub fn reward_last(&self) -> f64 { self.reward_last }
    pub fn total_reward(&self) -> f64 { self.total_reward }
    pub fn n_actions(&self) -> usize { Action::COUNT }
    pub fn n_states(&self) -> usize { self.grid.n_states() }

    pub fn state_index(&self) -> usize {
        self.grid.encode(self.agent.position)
    }

    /// Step with a raw action code; codes outside 0..=7 are caller bugs.
    pub fn step_code(&mut self, code: i64) -> Result<Step<usize>, DashError> {
        let action = Action::from_code(code)?;
        Ok(self.step(action))
    }

    /// Status header followed by the current map with the agent cell bracketed.
    pub fn text_view(&self) -> String {
        let (row, col) = self.agent.position;
        let mut out = format!(
            "position: ({row},{col}), jumps: {}/{}, treasure: {}\n",
            self.agent.jumps_left,
            self.config.max_jumps,
            if self.agent.has_treasure { "yes" } else { "no" },
        );
        if let Some(action) = self.agent.last_action {
            out.push_str(&format!("last action: {}\n", action.name()));
        }
        if let Some(err) = &self.last_info.error {
            out.push_str(&format!("info: {err}\n"));
        }
        if let Some(reason) = self.terminal {
            out.push_str(&format!("episode over: {}\n", reason.as_str()));
        }
        for (r, line) in self.map.row_strings().iter().enumerate() {
            for (c, symbol) in line.chars().enumerate() {
                if (r, c) == (row, col) {
                    out.push('[');
                    out.push(symbol);
                    out.push(']');
                } else {
                    out.push(symbol);
                }
            }
            out.push('\n');
        }
        out
    }

    fn info(&self, error: Option<String>) -> StepInfo {
        StepInfo { probability: 1.0, jumps_left: self.agent.jumps_left, has_treasure: self.agent.has_treasure, error }
    }
}

impl Env for ArcticDash {
    type Obs = usize;
    type Act = Action;

    fn reset(&mut self, _seed: Option<u64>) -> (usize, StepInfo) {
        self.map.restore(&self.grid);
        self.agent = AgentState::spawn(self.grid.start(), self.config.max_jumps);
        self.terminal = None;
        self.reward_last = 0.0;
        self.total_reward = 0.0;
        self.last_info = self.info(None);
        debug!(start = ?self.grid.start(), max_jumps = self.config.max_jumps, "episode reset");
        (self.state_index(), self.last_info.clone())
    }

    fn step(&mut self, action: Action) -> Step<usize> {
        if self.terminal.is_some() {
            // Frozen until reset.
            self.reward_last = 0.0;
            return Step {
                observation: self.state_index(),
                reward: 0.0,
                terminated: true,
                truncated: false,
                info: self.last_info.clone(),
            };
        }

        let t = resolve(&self.grid, &mut self.map, &mut self.agent, action, &self.config.rewards);
        self.terminal = t.terminal;
        self.reward_last = t.reward;
        self.total_reward += t.reward;
        let error = t.terminal.and_then(TerminalReason::error_message).map(str::to_string);
        self.last_info = self.info(error);

        if let Some(reason) = t.terminal {
            debug!(reason = reason.as_str(), position = ?self.agent.position, reward = t.reward, "episode terminated");
        }

        Step {
            observation: self.state_index(),
            reward: t.reward,
            terminated: t.terminated(),
            truncated: false,
            info: self.last_info.clone(),
        }
    }
}
