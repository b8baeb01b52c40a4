use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind};
use crate::map::{GridMap, MapState, Position};
use crate::tile::Tile;

/// Fixed penalty for off-map moves, malformed jumps and jumping with none left.
/// Not configurable: trained policies depend on it.
pub const ILLEGAL_MOVE_PENALTY: f64 = -400.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub move_cost: f64,
    pub jump_cost: f64,
    pub hole_penalty: f64,
    pub pickup_reward: f64,
    pub goal_reward: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self { move_cost: -1.0, jump_cost: -7.5, hole_penalty: -200.0, pickup_reward: 1_000.0, goal_reward: 100_000.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalReason {
    OutOfBounds,
    InvalidJump,
    NoJumpsAvailable,
    FellInHole,
    ReturnedWithTreasure,
}

impl TerminalReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminalReason::OutOfBounds => "out-of-bounds",
            TerminalReason::InvalidJump => "invalid-jump",
            TerminalReason::NoJumpsAvailable => "no-jumps-available",
            TerminalReason::FellInHole => "fell-in-hole",
            TerminalReason::ReturnedWithTreasure => "returned-with-treasure",
        }
    }

    /// Message reported in step info for the penalised illegal actions.
    pub fn error_message(self) -> Option<&'static str> {
        match self {
            TerminalReason::OutOfBounds => Some("move off the map, episode over"),
            TerminalReason::InvalidJump => Some("invalid jump, episode over"),
            TerminalReason::NoJumpsAvailable => Some("no jumps left, episode over"),
            TerminalReason::FellInHole | TerminalReason::ReturnedWithTreasure => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Position,
    pub jumps_left: u32,
    pub has_treasure: bool,
    pub last_action: Option<Action>,
    /// Visited cells, no two consecutive entries equal. Starts at the spawn cell.
    pub path_taken: Vec<Position>,
}

impl AgentState {
    pub fn spawn(start: Position, max_jumps: u32) -> Self {
        Self { position: start, jumps_left: max_jumps, has_treasure: false, last_action: None, path_taken: vec![start] }
    }
}

/// Result of resolving one action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub reward: f64,
    pub terminal: Option<TerminalReason>,
    /// The agent ended on a different cell than it started.
    pub moved: bool,
    pub jumps_left: u32,
    pub has_treasure: bool,
}

impl Transition {
    pub fn terminated(&self) -> bool {
        self.terminal.is_some()
    }

    fn rejected(agent: &AgentState, reason: TerminalReason) -> Self {
        Self {
            reward: ILLEGAL_MOVE_PENALTY,
            terminal: Some(reason),
            moved: false,
            jumps_left: agent.jumps_left,
            has_treasure: agent.has_treasure,
        }
    }
}

/// Landing cell for `action` from `from`, if it is a legal destination.
/// Jumps must travel exactly two cells along one axis.
fn landing(grid: &GridMap, from: Position, action: Action) -> Option<Position> {
    let (dr, dc) = action.delta();
    if action.is_jump() {
        let axis_aligned = (dr.abs() == 2 && dc == 0) || (dc.abs() == 2 && dr == 0);
        if !axis_aligned {
            return None;
        }
    }
    let r = from.0 as isize + dr;
    let c = from.1 as isize + dc;
    grid.in_bounds(r, c).then(|| (r as usize, c as usize))
}

/// Resolve one action, mutating `map` and `agent` in place.
///
/// Order: jump budget, destination validity, commit and cost, degradation of
/// the landed-on cell, then the effect of the (post-degradation) tile. Illegal
/// actions leave position, map and jump budget untouched.
pub fn resolve(
    grid: &GridMap,
    map: &mut MapState,
    agent: &mut AgentState,
    action: Action,
    rewards: &RewardConfig,
) -> Transition {
    agent.last_action = Some(action);
    let kind = action.kind();

    if kind == ActionKind::Jump && agent.jumps_left == 0 {
        return Transition::rejected(agent, TerminalReason::NoJumpsAvailable);
    }

    let Some(dest) = landing(grid, agent.position, action) else {
        let reason = match kind {
            ActionKind::Step => TerminalReason::OutOfBounds,
            ActionKind::Jump => TerminalReason::InvalidJump,
        };
        return Transition::rejected(agent, reason);
    };

    let mut reward = match kind {
        ActionKind::Step => rewards.move_cost,
        ActionKind::Jump => {
            agent.jumps_left -= 1;
            rewards.jump_cost
        }
    };

    let moved = dest != agent.position;
    agent.position = dest;
    if moved {
        if agent.path_taken.last() != Some(&dest) {
            agent.path_taken.push(dest);
        }
        if !grid.tile_at(dest).is_landmark() {
            let current = map.get(dest);
            map.set(dest, current.degrade(kind));
        }
    }

    let mut terminal = None;
    match map.get(dest) {
        Tile::Hole => {
            reward += rewards.hole_penalty;
            terminal = Some(TerminalReason::FellInHole);
        }
        Tile::Goal if !agent.has_treasure => {
            agent.has_treasure = true;
            reward += rewards.pickup_reward;
        }
        Tile::Start if agent.has_treasure => {
            reward += rewards.goal_reward;
            terminal = Some(TerminalReason::ReturnedWithTreasure);
        }
        _ => {}
    }

    Transition { reward, terminal, moved, jumps_left: agent.jumps_left, has_treasure: agent.has_treasure }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(rows: &[&str], jumps: u32) -> (GridMap, MapState, AgentState) {
        let grid = GridMap::parse(rows).unwrap();
        let map = grid.fresh_state();
        let agent = AgentState::spawn(grid.start(), jumps);
        (grid, map, agent)
    }

    #[test]
    fn step_onto_ice_costs_move_and_weakens_it() {
        let (g, mut m, mut a) = setup(&["SFG"], 2);
        let t = resolve(&g, &mut m, &mut a, Action::Right, &RewardConfig::default());
        assert_eq!(t.reward, -1.0);
        assert!(!t.terminated());
        assert!(t.moved);
        assert_eq!(a.position, (0, 1));
        assert_eq!(m.get((0, 1)), Tile::WeakIce);
        assert_eq!(a.path_taken, vec![(0, 0), (0, 1)]);
        assert_eq!(a.last_action, Some(Action::Right));
    }

    #[test]
    fn off_map_step_is_rejected_in_place() {
        let (g, mut m, mut a) = setup(&["SFG"], 2);
        let t = resolve(&g, &mut m, &mut a, Action::Up, &RewardConfig::default());
        assert_eq!(t.reward, ILLEGAL_MOVE_PENALTY);
        assert_eq!(t.terminal, Some(TerminalReason::OutOfBounds));
        assert_eq!(a.position, (0, 0));
        assert_eq!(a.path_taken.len(), 1);
        assert_eq!(m, g.fresh_state());
    }

    #[test]
    fn off_map_jump_keeps_budget() {
        let (g, mut m, mut a) = setup(&["SFG"], 2);
        let t = resolve(&g, &mut m, &mut a, Action::JumpLeft, &RewardConfig::default());
        assert_eq!(t.reward, ILLEGAL_MOVE_PENALTY);
        assert_eq!(t.terminal, Some(TerminalReason::InvalidJump));
        assert_eq!(t.jumps_left, 2);
        assert_eq!(a.position, (0, 0));
    }

    #[test]
    fn empty_budget_beats_destination_check() {
        let (g, mut m, mut a) = setup(&["SFFG"], 0);
        // Valid landing cell, but no jumps.
        let t = resolve(&g, &mut m, &mut a, Action::JumpRight, &RewardConfig::default());
        assert_eq!(t.terminal, Some(TerminalReason::NoJumpsAvailable));
        assert_eq!(t.reward, ILLEGAL_MOVE_PENALTY);
        // Off-map landing, still reported as no jumps.
        let (g, mut m, mut a) = setup(&["SFFG"], 0);
        let t = resolve(&g, &mut m, &mut a, Action::JumpUp, &RewardConfig::default());
        assert_eq!(t.terminal, Some(TerminalReason::NoJumpsAvailable));
        assert_eq!(t.jumps_left, 0);
        assert_eq!(m, g.fresh_state());
    }

    #[test]
    fn jump_spends_budget_and_skips_middle_cell() {
        let (g, mut m, mut a) = setup(&["SWFG"], 2);
        let t = resolve(&g, &mut m, &mut a, Action::JumpRight, &RewardConfig::default());
        assert_eq!(t.reward, -7.5);
        assert_eq!(t.jumps_left, 1);
        assert_eq!(a.position, (0, 2));
        assert_eq!(m.get((0, 1)), Tile::WeakIce);
        assert_eq!(m.get((0, 2)), Tile::WeakIce);
    }

    #[test]
    fn jump_onto_weak_ice_collapses_it() {
        let (g, mut m, mut a) = setup(&["SFWG"], 2);
        let t = resolve(&g, &mut m, &mut a, Action::JumpRight, &RewardConfig::default());
        assert_eq!(m.get((0, 2)), Tile::Hole);
        assert_eq!(t.terminal, Some(TerminalReason::FellInHole));
        assert_eq!(t.reward, -7.5 + -200.0);
    }

    #[test]
    fn stepping_into_existing_hole_falls() {
        let (g, mut m, mut a) = setup(&["SHG"], 2);
        let t = resolve(&g, &mut m, &mut a, Action::Right, &RewardConfig::default());
        assert_eq!(t.terminal, Some(TerminalReason::FellInHole));
        assert_eq!(t.reward, -201.0);
        assert_eq!(a.position, (0, 1));
    }

    #[test]
    fn goal_pickup_then_return_wins() {
        let (g, mut m, mut a) = setup(&["SG"], 2);
        let rw = RewardConfig::default();
        let t = resolve(&g, &mut m, &mut a, Action::Right, &rw);
        assert_eq!(t.reward, 999.0);
        assert!(t.has_treasure);
        assert!(!t.terminated());
        assert_eq!(m.get((0, 1)), Tile::Goal);
        let t = resolve(&g, &mut m, &mut a, Action::Left, &rw);
        assert_eq!(t.reward, 99_999.0);
        assert_eq!(t.terminal, Some(TerminalReason::ReturnedWithTreasure));
        assert_eq!(m.get((0, 0)), Tile::Start);
    }

    #[test]
    fn start_without_treasure_is_plain() {
        let (g, mut m, mut a) = setup(&["SFG"], 2);
        let rw = RewardConfig::default();
        resolve(&g, &mut m, &mut a, Action::Right, &rw);
        let t = resolve(&g, &mut m, &mut a, Action::Left, &rw);
        assert_eq!(t.reward, -1.0);
        assert!(!t.terminated());
    }

    #[test]
    fn rejection_messages_only_for_penalised_reasons() {
        assert!(TerminalReason::OutOfBounds.error_message().is_some());
        assert!(TerminalReason::InvalidJump.error_message().is_some());
        assert!(TerminalReason::NoJumpsAvailable.error_message().is_some());
        assert!(TerminalReason::FellInHole.error_message().is_none());
        assert_eq!(
            serde_json::to_string(&TerminalReason::ReturnedWithTreasure).unwrap(),
            format!("\"{}\"", TerminalReason::ReturnedWithTreasure.as_str())
        );
    }
}
