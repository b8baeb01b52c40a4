use serde::{Deserialize, Serialize};

use crate::action::ActionKind;

/// Tile symbols as they appear in map strings:
/// S: Start, G: Goal, F: Ice, H: Hole, W: Weak ice, V: Very weak ice
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    #[serde(rename = "S")]
    Start,
    #[serde(rename = "G")]
    Goal,
    #[serde(rename = "F")]
    Ice,
    #[serde(rename = "H")]
    Hole,
    #[serde(rename = "W")]
    WeakIce,
    #[serde(rename = "V")]
    VeryWeakIce,
}

impl Tile {
    pub fn from_symbol(symbol: char) -> Option<Tile> {
        match symbol {
            'S' => Some(Tile::Start),
            'G' => Some(Tile::Goal),
            'F' => Some(Tile::Ice),
            'H' => Some(Tile::Hole),
            'W' => Some(Tile::WeakIce),
            'V' => Some(Tile::VeryWeakIce),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Tile::Start => 'S',
            Tile::Goal => 'G',
            Tile::Ice => 'F',
            Tile::Hole => 'H',
            Tile::WeakIce => 'W',
            Tile::VeryWeakIce => 'V',
        }
    }

    /// Start and goal never degrade.
    pub fn is_landmark(self) -> bool {
        matches!(self, Tile::Start | Tile::Goal)
    }

    /// Next stage of the ice chain after being landed on. Jumps skip the
    /// very-weak stage; tiles outside the chain are returned unchanged.
    pub fn degrade(self, kind: ActionKind) -> Tile {
        match (self, kind) {
            (Tile::Ice, _) => Tile::WeakIce,
            (Tile::WeakIce, ActionKind::Step) => Tile::VeryWeakIce,
            (Tile::WeakIce, ActionKind::Jump) => Tile::Hole,
            (Tile::VeryWeakIce, _) => Tile::Hole,
            (other, _) => other,
        }
    }
}
