//! Pure Arctic Dash logic crate.
//! - Tile encoding and the ice degradation chain
//! - Immutable layout (`GridMap`) and per-episode overlay (`MapState`)
//! - Action table, transition rules and the episode controller
//! - Embedded preset maps

mod action;
mod engine;
mod episode;
mod error;
mod map;
mod preset;
mod tile;

pub use action::{Action, ActionKind};
pub use engine::{resolve, AgentState, RewardConfig, TerminalReason, Transition, ILLEGAL_MOVE_PENALTY};
pub use episode::{ArcticDash, Env, EnvConfig, Step, StepInfo};
pub use error::DashError;
pub use map::{GridMap, MapState, Position};
pub use preset::{preset_map, preset_names, preset_rows, DEFAULT_MAP};
pub use tile::Tile;
