use serde::{Deserialize, Serialize};

use crate::error::DashError;

/// Discrete actions. Codes 0..=3 step one cell, 4..=7 jump two cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Action {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
    JumpLeft = 4,
    JumpDown = 5,
    JumpRight = 6,
    JumpUp = 7,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Step,
    Jump,
}

impl Action {
    pub const COUNT: usize = 8;

    pub const ALL: [Action; Action::COUNT] = [
        Action::Left,
        Action::Down,
        Action::Right,
        Action::Up,
        Action::JumpLeft,
        Action::JumpDown,
        Action::JumpRight,
        Action::JumpUp,
    ];

    pub fn from_code(code: i64) -> Result<Action, DashError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Action::ALL.get(i).copied())
            .ok_or(DashError::InvalidAction(code))
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// (Δrow, Δcol)
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Left => (0, -1),
            Action::Down => (1, 0),
            Action::Right => (0, 1),
            Action::Up => (-1, 0),
            Action::JumpLeft => (0, -2),
            Action::JumpDown => (2, 0),
            Action::JumpRight => (0, 2),
            Action::JumpUp => (-2, 0),
        }
    }

    pub fn kind(self) -> ActionKind {
        if self.code() >= Action::JumpLeft.code() {
            ActionKind::Jump
        } else {
            ActionKind::Step
        }
    }

    pub fn is_jump(self) -> bool {
        self.kind() == ActionKind::Jump
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Left => "move left",
            Action::Down => "move down",
            Action::Right => "move right",
            Action::Up => "move up",
            Action::JumpLeft => "jump left",
            Action::JumpDown => "jump down",
            Action::JumpRight => "jump right",
            Action::JumpUp => "jump up",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = DashError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Action::from_code(i64::from(v))
    }
}
